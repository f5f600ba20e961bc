//! CLI command implementations.

mod cat;
mod cp;
pub(crate) mod drafts;
mod ls;
mod mkdir;
mod mv;
mod new;
mod rm;
mod save;
mod upload;

pub(crate) use cat::CatArgs;
pub(crate) use cp::CpArgs;
pub(crate) use drafts::DraftsCommand;
pub(crate) use ls::LsArgs;
pub(crate) use mkdir::MkdirArgs;
pub(crate) use mv::MvArgs;
pub(crate) use new::NewArgs;
pub(crate) use rm::RmArgs;
pub(crate) use save::SaveArgs;
pub(crate) use upload::UploadArgs;
