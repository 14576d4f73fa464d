mod freepik_like;
pub mod imagen3;
pub mod mystic;

pub use imagen3::Imagen3;
pub use mystic::Mystic;
