mod comments;
mod layout;
mod posts;

pub use self::{
    comments::{AdminComment, CommentStore, Unreadable},
    layout::DataDir,
    posts::{PostRepository, PostSummary, PostTitles, categories_of},
};
