pub mod dispatcher;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod ytdl;
