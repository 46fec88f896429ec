//! Track library, favourites and playlists

pub mod favourites;
pub mod playlists;
pub mod scan;

pub use favourites::Favourites;
pub use playlists::PlaylistManager;
pub use scan::Library;
