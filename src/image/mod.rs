//! Image containers and views.
//!
//! - `bmp`: byte-exact reader/writer for uncompressed 24-bit bitmap files.
//! - `bgr`: borrowed view over padded B,G,R rows (a whole image or one band).
//! - `u8`: owned single-channel buffer used for the grayscale pass.
//! - `io`: preview and JSON helpers.
pub mod bgr;
pub mod bmp;
pub mod io;
pub mod traits;
pub mod u8;

pub use self::bgr::{row_stride, BgrView};
pub use self::bmp::{BmpFileHeader, BmpImage, BmpInfoHeader};
pub use self::traits::{ImageView, ImageViewMut, Rows};
pub use self::u8::GrayImage;
