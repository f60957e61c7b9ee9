pub mod builtin;
pub mod character;
pub mod repository;

pub use character::{CharacterCategory, CharacterDefinition, HangerDecoration, ImageSource};
pub use repository::{CharacterCatalog, CharacterOverride, CharacterRepository};
