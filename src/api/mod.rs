pub mod node_dto;
pub mod settings_dto;
