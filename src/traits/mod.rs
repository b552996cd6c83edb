mod model;
pub use model::Model;
