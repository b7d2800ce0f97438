mod cli;
mod format;


pub(crate) use cli::{as_cli, split_user_flag};
