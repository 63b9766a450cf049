//! Command execution for the `skillpath` binary

pub mod command;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::Session;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, SessionFile};
use crate::error::Error;
use crate::model::Question;
use crate::service::{
    Accounts, Achievements, Catalog, Classroom, Learning, LessonDraft, Outcome, QuizOutcome,
};
use crate::store::JsonFileStore;
use command::{
    ClassCommand, Command, LessonArgs, LessonCommand, PathCommand, QuizCommand, UsersCommand,
    zero_based,
};

/// Questions authored in a JSON file, either a bare array or an object with
/// an optional title
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuizFile {
    Bare(Vec<Question>),
    Titled {
        #[serde(default)]
        title: Option<String>,
        questions: Vec<Question>,
    },
}

impl QuizFile {
    fn into_parts(self) -> (Option<String>, Vec<Question>) {
        match self {
            QuizFile::Bare(questions) => (None, questions),
            QuizFile::Titled { title, questions } => (title, questions),
        }
    }
}

async fn read_quiz_file(path: &Path) -> Result<(Option<String>, Vec<Question>)> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read quiz from {:?}", path))?;
    let file: QuizFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse quiz file {:?}", path))?;
    Ok(file.into_parts())
}

impl From<LessonArgs> for LessonDraft {
    fn from(args: LessonArgs) -> Self {
        args.resources
            .into_iter()
            .fold(LessonDraft::new(args.title, args.body), |draft, (title, url)| {
                draft.with_resource(title, url)
            })
    }
}

fn applied<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Rejected(rejection) => Err(Error::Rejected(rejection).into()),
    }
}

/// The main application
pub struct App {
    /// Application configuration
    config: Config,

    store: JsonFileStore,

    clock: Box<dyn Clock>,

    /// Signed-in user, persisted at `session_path`
    session: SessionFile,
    session_path: PathBuf,
}

impl App {
    /// Open the store and session named by the config
    pub fn new(config: Config) -> Result<Self> {
        let store_path = config.store_file()?;
        let session_path = SessionFile::default_path()?;
        Self::open(config, store_path, session_path, Box::new(SystemClock))
    }

    /// Open with explicit locations and time source
    pub fn open(
        config: Config,
        store_path: PathBuf,
        session_path: PathBuf,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        let session = SessionFile::load_from(&session_path)?;
        tracing::debug!("Using store {:?}", store_path);
        Ok(Self { config, store: JsonFileStore::open(store_path), clock, session, session_path })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.current.as_ref()
    }

    fn set_session(&mut self, session: Option<Session>) -> Result<()> {
        self.session.current = session;
        self.session.save_to(&self.session_path)
    }

    /// Run one command and return what to print
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Signup { name, email, role } => {
                let accounts = Accounts::new(&self.store, &*self.clock);
                let user = accounts.sign_up(&name, &email, role).await?;
                let session = Session::new(&user.id, user.role);
                self.set_session(Some(session))?;
                Ok(format!("Welcome, {}! Signed in as {}.", user.fullname, user.role))
            }
            Command::Login { email } => {
                let session = Accounts::new(&self.store, &*self.clock).sign_in(&email).await?;
                let user = Accounts::new(&self.store, &*self.clock).get_user(&session.user_id).await?;
                self.set_session(Some(session))?;
                Ok(format!("Signed in as {}", render::user(&user)))
            }
            Command::Logout => {
                self.set_session(None)?;
                Ok("Signed out.".to_string())
            }
            Command::Whoami => match self.session() {
                Some(session) => {
                    let accounts = Accounts::new(&self.store, &*self.clock);
                    Ok(render::user(&accounts.profile(session).await?))
                }
                None => Ok("Not logged in.".to_string()),
            },
            Command::Path(cmd) => self.path(cmd).await,
            Command::Lesson(cmd) => self.lesson(cmd).await,
            Command::Quiz(cmd) => self.quiz(cmd).await,
            Command::Status { path } => self.status(path).await,
            Command::Class(cmd) => self.class(cmd).await,
            Command::Users(cmd) => self.users(cmd).await,
            Command::Achievements => {
                let session = self.session.require()?;
                let overview = Achievements::new(&self.store, &*self.clock).overview(session).await?;
                Ok(render::overview(&overview))
            }
        }
    }

    async fn path(&self, cmd: PathCommand) -> Result<String> {
        let catalog = Catalog::new(&self.store, &*self.clock);
        match cmd {
            PathCommand::List => Ok(render::paths(&catalog.list_paths().await?)),
            PathCommand::Show { path } => {
                let contents = catalog.path_contents(&path).await?;
                Ok(render::path_contents(&contents, self.config.wrap_width))
            }
            PathCommand::Create { title, description, level } => {
                let session = self.session.require()?;
                let path = catalog.create_path(session, &title, &description, level).await?;
                Ok(format!("Created path {} ({})", path.title, path.id))
            }
            PathCommand::Delete { path } => {
                catalog.delete_path(self.session.require()?, &path).await?;
                Ok(format!("Deleted path {}", path))
            }
            PathCommand::Apply { path } => {
                let session = self.session.require()?;
                Learning::new(&self.store, &*self.clock).apply(session, &path).await?;
                Ok(format!("Applied to path {}", path))
            }
            PathCommand::LessonAdd { path, lesson } => {
                let session = self.session.require()?;
                let lesson = catalog.add_lesson(session, &path, lesson.into()).await?;
                Ok(format!("Added lesson {} ({})", lesson.title, lesson.id))
            }
            PathCommand::QuizAdd { path, lesson, file, title } => {
                let session = self.session.require()?;
                let (file_title, questions) = read_quiz_file(&file).await?;
                let title = title.or(file_title);
                let quiz =
                    catalog.add_quiz(session, &path, &lesson, title.as_deref(), questions).await?;
                Ok(format!("Added quiz {} ({}) with {} questions", quiz.title, quiz.id, quiz.len()))
            }
        }
    }

    async fn lesson(&self, cmd: LessonCommand) -> Result<String> {
        let session = self.session.require()?;
        let learning = Learning::new(&self.store, &*self.clock);
        match cmd {
            LessonCommand::Done { path, lesson } => {
                if learning.complete_lesson(session, &path, &lesson).await? {
                    Ok("Lesson completed.".to_string())
                } else {
                    Ok("Lesson was already completed.".to_string())
                }
            }
            LessonCommand::Undo { path, lesson } => {
                if learning.unread_lesson(session, &path, &lesson).await? {
                    Ok("Lesson marked unread.".to_string())
                } else {
                    Ok("Lesson was not completed.".to_string())
                }
            }
        }
    }

    async fn quiz(&self, cmd: QuizCommand) -> Result<String> {
        let session = self.session.require()?;
        let learning = Learning::new(&self.store, &*self.clock);
        match cmd {
            QuizCommand::Answer { path, quiz, question, choice } => {
                let question = zero_based(question, "Question")?;
                let choice = zero_based(choice, "Choice")?;
                let state = applied(learning.answer(session, &path, &quiz, question, choice).await?)?;
                Ok(format!("Quiz {}: {}", quiz, render::quiz_state(&state)))
            }
            QuizCommand::Redo { path, quiz } => {
                let hearts = applied(learning.redo_quiz(session, &path, &quiz).await?)?;
                let mut out = format!("Quiz reset. Hearts: {}", render::hearts(hearts.hearts()));
                if let Some(countdown) = hearts.countdown(self.clock.now()) {
                    out.push_str(&format!("  refill in {}", countdown));
                }
                Ok(out)
            }
        }
    }

    async fn status(&self, path: Option<String>) -> Result<String> {
        let session = self.session.require()?;
        let learning = Learning::new(&self.store, &*self.clock);
        let path_ids = match path {
            Some(path) => vec![path],
            None => learning.applied_paths(session).await?.into_iter().map(|p| p.path_id).collect(),
        };
        if path_ids.is_empty() {
            return Ok("Not applied to any learning path yet.".to_string());
        }

        let mut out = Vec::new();
        for path_id in path_ids {
            out.push(render::status(&learning.status(session, &path_id).await?));
        }
        Ok(out.join("\n\n"))
    }

    async fn class(&self, cmd: ClassCommand) -> Result<String> {
        let session = self.session.require()?;
        let classroom = Classroom::new(&self.store, &*self.clock);
        match cmd {
            ClassCommand::List => Ok(render::classes(&classroom.list_classes(session).await?)),
            ClassCommand::Create { name } => {
                let class = classroom.create_class(session, &name).await?;
                Ok(format!("Created class {} ({}). Join code: {}", class.name, class.id, class.code))
            }
            ClassCommand::Join { code } => {
                let class = classroom.join_class(session, &code).await?;
                Ok(format!("Joined {} taught by {}", class.name, class.professor_name))
            }
            ClassCommand::Delete { class } => {
                classroom.delete_class(session, &class).await?;
                Ok(format!("Deleted class {}", class))
            }
            ClassCommand::Kick { class, student } => {
                classroom.remove_student(session, &class, &student).await?;
                Ok(format!("Removed {} from class {}", student, class))
            }
            ClassCommand::AddLesson { class, lesson } => {
                let lesson = classroom.add_lesson(session, &class, lesson.into()).await?;
                Ok(format!("Posted lesson {} ({})", lesson.title, lesson.id))
            }
            ClassCommand::AddQuiz { class, title, file } => {
                let (_, questions) = read_quiz_file(&file).await?;
                let quiz = classroom.add_quiz(session, &class, &title, questions).await?;
                Ok(format!("Posted quiz {} ({}) with {} questions", quiz.title, quiz.id, quiz.len()))
            }
            ClassCommand::Show { class } => {
                let items = classroom.class_content(session, &class).await?;
                let class = classroom.get_class(&class).await?;
                Ok(render::class_content(&class, &items, self.config.wrap_width))
            }
            ClassCommand::Take { class, quiz, answers } => {
                let answers = answers
                    .into_iter()
                    .map(|a| zero_based(a, "Choice"))
                    .collect::<Result<Vec<_>>>()?;
                match classroom.take_quiz(session, &class, &quiz, &answers).await? {
                    QuizOutcome::Scored(attempt) => Ok(format!("Submitted. {}", render::attempt(&attempt))),
                    QuizOutcome::AlreadyAttempted(attempt) => Ok(format!(
                        "You already took this quiz. {}",
                        render::attempt(&attempt)
                    )),
                }
            }
            ClassCommand::Grades { class } => {
                Ok(render::grades(&classroom.attempts(session, &class).await?))
            }
        }
    }

    async fn users(&self, cmd: UsersCommand) -> Result<String> {
        let session = self.session.require()?;
        let accounts = Accounts::new(&self.store, &*self.clock);
        match cmd {
            UsersCommand::List { role } => Ok(render::users(&accounts.list_users(session, role).await?)),
            UsersCommand::Rename { user, name } => {
                accounts.rename_user(session, &user, &name).await?;
                Ok(format!("Renamed {} to {}", user, name.trim()))
            }
            UsersCommand::Delete { user } => {
                accounts.delete_user(session, &user).await?;
                Ok(format!("Deleted user {}", user))
            }
            UsersCommand::Promote { user } => {
                accounts.promote_to_admin(session, &user).await?;
                Ok(format!("Promoted {} to admin", user))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::{Level, Role};
    use crate::store::{DocumentStore, docpath};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct SharedClock(Arc<ManualClock>);

    impl Clock for SharedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            self.0.now()
        }
    }

    fn app(dir: &Path, clock: Arc<ManualClock>) -> App {
        App::open(
            Config::default(),
            dir.join("store.json"),
            dir.join("session.json"),
            Box::new(SharedClock(clock)),
        )
        .unwrap()
    }

    async fn make_admin(app: &App, email: &str) {
        let session = Accounts::new(&app.store, &*app.clock).sign_in(email).await.unwrap();
        let doc = docpath::user(&session.user_id);
        app.store.merge(&doc, serde_json::json!({ "role": "admin" })).await.unwrap();
    }

    #[tokio::test]
    async fn session_survives_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));

        let mut first = app(dir.path(), clock.clone());
        let signup = Command::Signup {
            name: "Ana".into(),
            email: "ana@uni.edu".into(),
            role: Role::Student,
        };
        first.execute(signup).await.unwrap();

        let mut second = app(dir.path(), clock);
        let who = second.execute(Command::Whoami).await.unwrap();
        assert!(who.starts_with("Ana <ana@uni.edu> [student]"));

        second.execute(Command::Logout).await.unwrap();
        assert_eq!(second.execute(Command::Whoami).await.unwrap(), "Not logged in.");
        assert!(second.execute(Command::Achievements).await.is_err());
    }

    #[tokio::test]
    async fn student_walks_a_path_from_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let mut app = app(dir.path(), clock.clone());

        app.execute(Command::Signup {
            name: "Root".into(),
            email: "root@uni.edu".into(),
            role: Role::Student,
        })
        .await
        .unwrap();
        make_admin(&app, "root@uni.edu").await;
        app.execute(Command::Login { email: "root@uni.edu".into() }).await.unwrap();

        let admin = app.session().cloned().unwrap();
        let (path, lesson) = {
            let catalog = Catalog::new(&app.store, &*app.clock);
            let path = catalog.create_path(&admin, "HTML", "Markup", Level::Beginner).await.unwrap();
            let draft = LessonDraft::new("Tags", "<p>");
            let lesson = catalog.add_lesson(&admin, &path.id, draft).await.unwrap();
            (path, lesson)
        };

        let quiz_path = dir.path().join("quiz.json");
        std::fs::write(
            &quiz_path,
            r#"{"title": "Tags quiz", "questions": [
                {"questionText": "Paragraph tag?", "choices": [
                    {"text": "<p>", "isCorrect": true}, {"text": "<a>"}]}]}"#,
        )
        .unwrap();
        let added = app
            .execute(Command::Path(PathCommand::QuizAdd {
                path: path.id.clone(),
                lesson: lesson.id.clone(),
                file: quiz_path,
                title: None,
            }))
            .await
            .unwrap();
        assert!(added.starts_with("Added quiz Tags quiz"));
        let catalog = Catalog::new(&app.store, &*app.clock);
        let quiz = catalog.path_contents(&path.id).await.unwrap().quizzes.remove(0);

        app.execute(Command::Signup {
            name: "Kid".into(),
            email: "kid@uni.edu".into(),
            role: Role::Student,
        })
        .await
        .unwrap();
        app.execute(Command::Path(PathCommand::Apply { path: path.id.clone() })).await.unwrap();
        app.execute(Command::Lesson(LessonCommand::Done {
            path: path.id.clone(),
            lesson: lesson.id.clone(),
        }))
        .await
        .unwrap();

        let answer = QuizCommand::Answer {
            path: path.id.clone(),
            quiz: quiz.id.clone(),
            question: 1,
            choice: 2,
        };
        let out = app.execute(Command::Quiz(answer.clone())).await.unwrap();
        assert!(out.ends_with("0/1 correct, redo available"));

        let err = app.execute(Command::Quiz(answer)).await.unwrap_err();
        assert_eq!(err.to_string(), "Question 1 already answered");

        let redo = QuizCommand::Redo { path: path.id.clone(), quiz: quiz.id.clone() };
        let out = app.execute(Command::Quiz(redo)).await.unwrap();
        assert_eq!(out, "Quiz reset. Hearts: ♥♥♥♥♡  refill in 03:00:00");

        clock.advance(Duration::hours(3));
        let status = app.execute(Command::Status { path: None }).await.unwrap();
        assert!(status.contains("1/1 lessons (100%)"));
        assert!(status.contains("Hearts: ♥♥♥♥♥"));
    }

    #[test]
    fn quiz_file_accepts_bare_array() {
        let json = r#"[{"question": "Q", "choices": [{"text": "a", "isCorrect": true}, {"text": "b"}]}]"#;
        let (title, questions) = serde_json::from_str::<QuizFile>(json).unwrap().into_parts();
        assert_eq!(title, None);
        assert_eq!(questions.len(), 1);
    }
}
