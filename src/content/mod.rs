mod comment;
mod post;

pub use self::{
    comment::{
        Comment, CommentNode, MAX_DEPTH, NewComment, build_forest, generate_comment_id, walk,
    },
    post::{Post, PostDraft, PostId, PostMeta, extract_title},
};
