pub mod traits;
pub mod pixabay;
pub mod lookup;

pub use traits::{ImageSearch, SearchTransport};
pub use pixabay::PixabayTransport;
pub use lookup::ImageLookup;
