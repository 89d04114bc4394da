pub mod ansible;
pub mod hostname;
pub mod mapper;
pub mod node;
pub mod registry;
pub mod release;
pub mod remote;
pub mod settings;
pub mod ssh;
