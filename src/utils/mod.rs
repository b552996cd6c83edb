pub mod helper;

mod window;
pub use window::Window;

mod least_squares;
pub use least_squares::lstsq;
