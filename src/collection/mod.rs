pub mod normalize;
pub mod settings;
pub mod conflict;
pub mod persist;
pub mod store;

pub use normalize::*;
pub use settings::*;
pub use conflict::*;
pub use persist::*;
pub use store::*;
