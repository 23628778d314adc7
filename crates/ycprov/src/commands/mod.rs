//! Command handlers, one module per subcommand

pub mod delete_ydb;
pub mod generate_load;
pub mod operation;
pub mod reset_password;
pub mod users;
pub mod ydb;
