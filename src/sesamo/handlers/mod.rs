pub mod health;
pub use self::health::health;

pub mod trigger;
pub use self::trigger::trigger;
