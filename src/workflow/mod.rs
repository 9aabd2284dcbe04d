pub mod events;
pub mod question_queue;

pub use events::{
    Effect, EpisodeId, EventReceiver, EventSender, SessionEvent, SessionId, UserAction,
};
pub use question_queue::QuestionQueue;
