//! Application state and logic.

use crate::auth::{strip_provider_prefix, AuthService, SessionWatcher};
use crate::config::Config;
use crate::db::{Database, VocabSubscription};
use crate::flashcard::FlashcardDeck;
use crate::import;
use crate::models::{EntryDraft, EntryId, LevelGroups, VocabEntry, LEVEL_COUNT};
use crate::quiz::QuizRound;
use crate::session::{check_access, Access, Redirect, Session};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Top-level screens, each carrying the access requirement its route
/// had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Home,
    Flashcards,
    Quiz,
    Admin,
}

impl Screen {
    pub fn access(&self) -> Access {
        match self {
            Self::SignIn => Access::Public,
            Self::Home | Self::Flashcards | Self::Quiz => Access::AnyUser,
            Self::Admin => Access::Admin,
        }
    }
}

/// Which sign-in field has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Sign-in form state; doubles as the sign-up form.
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub field: LoginField,
    /// Sign-up mode instead of sign-in.
    pub registering: bool,
    /// Inline error from the last attempt, provider prefix stripped.
    pub error: Option<String>,
}

impl LoginForm {
    fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            field: LoginField::Email,
            registering: false,
            error: None,
        }
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

/// Which admin pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFocus {
    List,
    Form,
    ImportPath,
}

/// Add/edit form state. `hsk` stays a string until submit, where it
/// parses with a fallback of 1 and clamps into range.
#[derive(Debug, Clone, Default)]
pub struct VocabForm {
    pub hanzi: String,
    pub pinyin: String,
    pub meaning: String,
    pub hsk: String,
    pub field: usize,
}

impl VocabForm {
    pub const FIELD_COUNT: usize = 4;

    pub fn field_label(idx: usize) -> &'static str {
        match idx {
            0 => "Hanzi",
            1 => "Pinyin",
            2 => "Meaning",
            _ => "HSK level",
        }
    }

    pub fn field_value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.hanzi,
            1 => &self.pinyin,
            2 => &self.meaning,
            _ => &self.hsk,
        }
    }

    fn field_value_mut(&mut self) -> &mut String {
        match self.field {
            0 => &mut self.hanzi,
            1 => &mut self.pinyin,
            2 => &mut self.meaning,
            _ => &mut self.hsk,
        }
    }

    fn load(entry: &VocabEntry) -> Self {
        Self {
            hanzi: entry.hanzi.clone(),
            pinyin: entry.pinyin.clone(),
            meaning: entry.meaning.clone(),
            hsk: entry.hsk.to_string(),
            field: 0,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn to_draft(&self) -> EntryDraft {
        let hsk = self.hsk.trim().parse::<i64>().unwrap_or(1);
        EntryDraft::new(&self.hanzi, &self.pinyin, &self.meaning, hsk)
    }
}

/// A queued CSV import. The tick after submit arms it instead of
/// running it, so one frame renders the uploading indicator before the
/// blocking work starts; the tick after that runs it.
#[derive(Debug, Clone)]
pub enum PendingImport {
    Queued(PathBuf),
    Armed(PathBuf),
}

/// Admin screen state. Holds the live subscription while the screen is
/// showing; leaving the screen releases it.
pub struct AdminState {
    pub entries: Vec<VocabEntry>,
    pub subscription: Option<VocabSubscription>,
    pub selected: usize,
    pub form: VocabForm,
    pub editing_id: Option<EntryId>,
    pub focus: AdminFocus,
    pub import_path: String,
    pub uploading: bool,
    pub pending_import: Option<PendingImport>,
    pub confirm_delete: Option<EntryId>,
    /// True until the first snapshot arrives.
    pub loading: bool,
    pub status: Option<String>,
}

impl AdminState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            subscription: None,
            selected: 0,
            form: VocabForm::default(),
            editing_id: None,
            focus: AdminFocus::List,
            import_path: String::new(),
            uploading: false,
            pending_import: None,
            confirm_delete: None,
            loading: false,
            status: None,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

pub struct App {
    pub config: Config,
    pub db: Database,
    pub auth: AuthService,
    pub watcher: SessionWatcher,
    pub session: Session,
    pub screen: Screen,
    pub login: LoginForm,
    pub groups: LevelGroups,
    pub home_error: Option<String>,
    pub selected_level: u8,
    pub flashcards: Option<FlashcardDeck>,
    pub quiz: Option<QuizRound>,
    pub admin: AdminState,
    /// Blocking alert; any key dismisses it.
    pub alert: Option<String>,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load();
        let vocab_path = config.vocab_db_path();
        if let Some(parent) = vocab_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let accounts_path = config.accounts_db_path();
        if let Some(parent) = accounts_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&vocab_path)?;
        let auth = AuthService::open(&accounts_path)?;
        Ok(Self::with_stores(config, db, auth))
    }

    fn with_stores(config: Config, db: Database, mut auth: AuthService) -> Self {
        let watcher = auth.watch();
        Self {
            config,
            db,
            auth,
            watcher,
            session: Session::new(),
            screen: Screen::Home,
            login: LoginForm::new(),
            groups: LevelGroups::default(),
            home_error: None,
            selected_level: 1,
            flashcards: None,
            quiz: None,
            admin: AdminState::new(),
            alert: None,
        }
    }

    /// Advance time-driven state: session changes, snapshot delivery,
    /// the deferred import, and screen timers.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if let Some(user) = self.watcher.latest() {
            self.session.apply(user, &self.config.auth.admin_emails);
            self.enforce_guard();
        }

        if let Some(snapshot) = self.admin.subscription.as_ref().and_then(|sub| sub.latest()) {
            self.admin.entries = snapshot;
            self.admin.loading = false;
            if self.admin.selected >= self.admin.entries.len() && !self.admin.entries.is_empty() {
                self.admin.selected = self.admin.entries.len() - 1;
            }
        }

        match self.admin.pending_import.take() {
            Some(PendingImport::Queued(path)) => {
                self.admin.pending_import = Some(PendingImport::Armed(path));
            }
            Some(PendingImport::Armed(path)) => self.run_import(&path),
            None => {}
        }

        if let Some(deck) = &mut self.flashcards {
            deck.tick(now);
        }
        if let Some(quiz) = &mut self.quiz {
            quiz.tick(now);
        }
    }

    /// Global quit is disabled while typing into a form or while a
    /// modal needs an answer.
    pub fn can_quit(&self) -> bool {
        if self.alert.is_some() || self.admin.confirm_delete.is_some() {
            return false;
        }
        match self.screen {
            Screen::SignIn => false,
            Screen::Admin => self.admin.focus == AdminFocus::List,
            _ => true,
        }
    }

    /// Leave the current screen, apply the target's guard, and run the
    /// landing screen's entry effects.
    pub fn navigate(&mut self, to: Screen) {
        let target = match check_access(to.access(), &self.session) {
            None => to,
            Some(Redirect::SignIn) => Screen::SignIn,
            Some(Redirect::Home) => Screen::Home,
        };

        self.leave_screen();
        self.screen = target;
        self.enter_screen();
    }

    /// Re-apply the current screen's guard after a session change.
    fn enforce_guard(&mut self) {
        if self.session.loading {
            return;
        }
        match check_access(self.screen.access(), &self.session) {
            Some(Redirect::SignIn) => self.navigate(Screen::SignIn),
            Some(Redirect::Home) => self.navigate(Screen::Home),
            None => {}
        }
    }

    fn leave_screen(&mut self) {
        match self.screen {
            Screen::Admin => {
                if let Some(sub) = self.admin.subscription.take() {
                    self.db.unsubscribe(sub.id());
                }
                self.admin.reset();
            }
            Screen::Flashcards => self.flashcards = None,
            Screen::Quiz => self.quiz = None,
            Screen::SignIn | Screen::Home => {}
        }
    }

    fn enter_screen(&mut self) {
        match self.screen {
            Screen::SignIn => self.login = LoginForm::new(),
            Screen::Home => self.load_home(),
            Screen::Admin => self.open_admin(),
            Screen::Flashcards | Screen::Quiz => {}
        }
    }

    fn load_home(&mut self) {
        match self.db.fetch_all() {
            Ok(entries) => {
                self.groups = LevelGroups::from_entries(entries);
                self.home_error = None;
            }
            Err(e) => {
                self.groups = LevelGroups::default();
                self.home_error = Some(format!("Load failed: {}", e));
            }
        }
    }

    fn open_admin(&mut self) {
        self.admin.reset();
        match self.db.subscribe_all() {
            Ok(sub) => {
                self.admin.subscription = Some(sub);
                self.admin.loading = true;
            }
            Err(e) => {
                self.admin.status = Some(format!("Subscription failed: {}", e));
            }
        }
    }

    fn refresh_session(&mut self) {
        if let Some(user) = self.watcher.latest() {
            self.session.apply(user, &self.config.auth.admin_emails);
        }
    }

    fn sign_out(&mut self) {
        self.auth.sign_out();
        self.refresh_session();
        self.navigate(Screen::SignIn);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.alert.is_some() {
            self.alert = None;
            return;
        }
        if self.session.loading {
            return;
        }
        if self.screen == Screen::Admin && self.admin.confirm_delete.is_some() {
            self.handle_confirm_key(key);
            return;
        }

        match self.screen {
            Screen::SignIn => self.handle_login_key(key),
            Screen::Home => self.handle_home_key(key),
            Screen::Flashcards => self.handle_flashcard_key(key),
            Screen::Quiz => self.handle_quiz_key(key),
            Screen::Admin => self.handle_admin_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.login.toggle_field(),
            KeyCode::BackTab | KeyCode::Up => self.login.toggle_field(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => {
                self.login.active_field_mut().pop();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.registering = !self.login.registering;
                self.login.error = None;
            }
            KeyCode::Char(c) => self.login.active_field_mut().push(c),
            _ => {}
        }
    }

    /// Run the sign-in or sign-up attempt. Failures stay inline on the
    /// form and keep the typed credentials for correction; success
    /// resets the form and navigates home.
    fn submit_login(&mut self) {
        let email = self.login.email.clone();
        let password = self.login.password.clone();
        let result = if self.login.registering {
            self.auth.sign_up(&email, &password)
        } else {
            self.auth.sign_in(&email, &password)
        };

        match result {
            Ok(_) => {
                self.login = LoginForm::new();
                self.refresh_session();
                self.navigate(Screen::Home);
            }
            Err(e) => {
                let text = e.to_string();
                self.login.error = Some(strip_provider_prefix(&text).to_string());
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='6') => self.selected_level = c as u8 - b'0',
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => {
                if (self.selected_level as usize) < LEVEL_COUNT {
                    self.selected_level += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => {
                if self.selected_level > 1 {
                    self.selected_level -= 1;
                }
            }
            KeyCode::Char('f') | KeyCode::Enter => self.start_flashcards(),
            KeyCode::Char('t') => self.start_quiz(),
            KeyCode::Char('a') => self.navigate(Screen::Admin),
            KeyCode::Char('r') => self.load_home(),
            KeyCode::Char('l') => self.sign_out(),
            _ => {}
        }
    }

    /// Levels with no words cannot start a study screen.
    fn start_flashcards(&mut self) {
        let set = self.groups.study_set(self.selected_level);
        if set.entries.is_empty() {
            return;
        }
        self.navigate(Screen::Flashcards);
        if self.screen == Screen::Flashcards {
            self.flashcards = Some(FlashcardDeck::new(set));
        }
    }

    fn start_quiz(&mut self) {
        let set = self.groups.study_set(self.selected_level);
        if set.entries.is_empty() {
            return;
        }
        self.navigate(Screen::Quiz);
        if self.screen == Screen::Quiz {
            self.quiz = Some(QuizRound::new(set));
        }
    }

    fn handle_flashcard_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.navigate(Screen::Home);
            return;
        }
        let now = Instant::now();
        let Some(deck) = &mut self.flashcards else {
            return;
        };
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => deck.flip(),
            KeyCode::Char('n') | KeyCode::Right => deck.next(now),
            KeyCode::Char('p') | KeyCode::Left => deck.prev(now),
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.navigate(Screen::Home);
            return;
        }
        let now = Instant::now();
        let Some(quiz) = &mut self.quiz else {
            return;
        };
        match key.code {
            KeyCode::Char(c @ '1'..='4') => quiz.select((c as u8 - b'1') as usize, now),
            KeyCode::Char('r') if quiz.is_finished() => quiz.restart(),
            _ => {}
        }
    }

    fn handle_admin_key(&mut self, key: KeyEvent) {
        match self.admin.focus {
            AdminFocus::List => self.handle_admin_list_key(key),
            AdminFocus::Form => self.handle_admin_form_key(key),
            AdminFocus::ImportPath => self.handle_admin_import_key(key),
        }
    }

    fn handle_admin_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.admin.entries.is_empty() {
                    self.admin.selected =
                        (self.admin.selected + 1).min(self.admin.entries.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.admin.selected = self.admin.selected.saturating_sub(1);
            }
            KeyCode::Char('a') => {
                self.admin.form.clear();
                self.admin.editing_id = None;
                self.admin.focus = AdminFocus::Form;
            }
            KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
            KeyCode::Char('d') => {
                if let Some(entry) = self.admin.entries.get(self.admin.selected) {
                    self.admin.confirm_delete = Some(entry.id);
                }
            }
            KeyCode::Char('i') => {
                self.admin.import_path.clear();
                self.admin.focus = AdminFocus::ImportPath;
            }
            KeyCode::Char('l') => self.sign_out(),
            KeyCode::Esc => self.navigate(Screen::Home),
            _ => {}
        }
    }

    fn start_edit(&mut self) {
        if let Some(entry) = self.admin.entries.get(self.admin.selected) {
            self.admin.form = VocabForm::load(entry);
            self.admin.editing_id = Some(entry.id);
            self.admin.focus = AdminFocus::Form;
        }
    }

    fn handle_admin_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.admin.form.clear();
                self.admin.editing_id = None;
                self.admin.focus = AdminFocus::List;
            }
            KeyCode::Enter => {
                if self.admin.form.field + 1 == VocabForm::FIELD_COUNT {
                    self.submit_form();
                } else {
                    self.admin.form.field += 1;
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.admin.form.field = (self.admin.form.field + 1) % VocabForm::FIELD_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.admin.form.field = self
                    .admin
                    .form
                    .field
                    .checked_sub(1)
                    .unwrap_or(VocabForm::FIELD_COUNT - 1);
            }
            KeyCode::Backspace => {
                self.admin.form.field_value_mut().pop();
            }
            KeyCode::Char(c) => self.admin.form.field_value_mut().push(c),
            _ => {}
        }
    }

    /// Create or update from the form. Empty required fields refuse the
    /// submit and keep the form; otherwise the form and edit mode clear
    /// regardless of the write's outcome, and a failed write raises a
    /// blocking alert.
    fn submit_form(&mut self) {
        let draft = self.admin.form.to_draft();
        if !draft.is_valid() {
            return;
        }

        let result = match self.admin.editing_id {
            Some(id) => self.db.update_entry(id, &draft),
            None => self.db.create_entry(&draft).map(|_| ()),
        };
        if let Err(e) = result {
            self.alert = Some(format!("Save failed: {}", e));
        }

        self.admin.form.clear();
        self.admin.editing_id = None;
        self.admin.focus = AdminFocus::List;
    }

    fn handle_admin_import_key(&mut self, key: KeyEvent) {
        // The prompt is inert while an import is in flight.
        if self.admin.uploading {
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.admin.import_path.clear();
                self.admin.focus = AdminFocus::List;
            }
            KeyCode::Enter => self.queue_import(),
            KeyCode::Backspace => {
                self.admin.import_path.pop();
            }
            KeyCode::Char(c) => self.admin.import_path.push(c),
            _ => {}
        }
    }

    fn queue_import(&mut self) {
        let path = self.admin.import_path.trim().to_string();
        if path.is_empty() || self.admin.uploading {
            return;
        }
        self.admin.uploading = true;
        self.admin.pending_import = Some(PendingImport::Queued(PathBuf::from(path)));
    }

    /// Parse and bulk-write the queued file. The success alert quotes
    /// the attempted row count, skipped rows included; the path input
    /// resets on completion either way.
    fn run_import(&mut self, path: &Path) {
        let outcome = import::parse_file(path).map_err(|e| e.to_string()).and_then(|parsed| {
            self.db
                .import_batch(&parsed.drafts)
                .map(|_| parsed.attempted)
                .map_err(|e| e.to_string())
        });

        match outcome {
            Ok(attempted) => self.alert = Some(format!("Imported {} words", attempted)),
            Err(e) => self.alert = Some(format!("Import failed: {}", e)),
        }

        self.admin.uploading = false;
        self.admin.import_path.clear();
        self.admin.focus = AdminFocus::List;
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.admin.confirm_delete.take() {
                    // The list updates through the store's snapshot, so
                    // nothing local needs rolling back on failure.
                    if let Err(e) = self.db.delete_entry(id) {
                        self.alert = Some(format!("Delete failed: {}", e));
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.admin.confirm_delete = None;
            }
            _ => {}
        }
    }
}
