mod class;
mod completion;
mod ids;
mod lesson;
mod notification;
mod post;
mod question;
mod tryout;
mod vocab;

pub use ids::{
    AttemptId, ClassId, CommentId, LessonId, ParseIdError, PostId, QuestionId, TryoutId, UserId,
    VocabEntryId, VocabSetId,
};

pub use class::{Class, ClassError, ClassLevel, DEFAULT_PASSING_SCORE};
pub use completion::CompletionRecord;
pub use lesson::{Lesson, LessonError};
pub use notification::{Notification, NotificationKind};
pub use post::{Comment, Post, PostError, MAX_COMMENT_LEN, MAX_POST_LEN};
pub use question::{grade, Answer, GradeReport, Question, QuestionError, MAX_CHOICES, MIN_CHOICES};
pub use tryout::{AttemptError, AttemptState, Tryout, TryoutAttempt, TryoutError};
pub use vocab::{VocabEntry, VocabError, VocabSet};
