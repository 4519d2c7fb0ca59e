pub mod alert;
pub mod coin;
pub mod portfolio;
pub mod price;
pub mod settings;
