//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the editing session and saved-tree use cases to Dart via FRB.
//! - Hand derived geometry to the shell as JSON snapshots.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One process-wide editing session, serialized by a single `Mutex`.
//! - Every failure comes back as `ok=false` plus a human-readable message.

use famtree_core::db::open_db;
use famtree_core::model::validation::normalize_tree_name;
use famtree_core::{
    core_version as core_version_inner, export_request, init_logging as init_logging_inner,
    ping as ping_inner, render_scene, AttachKind, DragMode, Gender, ImageFormat, LineHandle,
    LineType, NewPerson, PersonId, PersonPatch, Point, SqliteTreeRepository, TreeService,
    TreeServiceError, TreeStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "famtree.sqlite3";
const DB_PATH_ENV: &str = "FAMTREE_DB_PATH";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

#[derive(Default)]
struct Session {
    store: TreeStore,
    tree_name: Option<String>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error`, case-insensitive.
/// - `log_dir`: absolute directory for rolling `famtree` log files.
/// - Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Created person or line id, when the command created one.
    pub id: Option<String>,
    /// Human-readable message for the status bar.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// JSON payload envelope for read calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub ok: bool,
    /// Serialized payload; empty on failure.
    pub json: String,
    pub message: String,
}

impl JsonResponse {
    fn from_value<T: serde::Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => Self {
                ok: true,
                json,
                message: String::new(),
            },
            Err(err) => Self::failure(format!("serialization failed: {err}")),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            json: String::new(),
            message: message.into(),
        }
    }
}

/// Saved tree names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListResponse {
    pub names: Vec<String>,
    pub message: String,
}

/// Starts a new tree whose root is the given person.
///
/// A blank `tree_name` is rejected before the session is touched.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_new(
    tree_name: String,
    name: String,
    birth_year: Option<String>,
    gender: String,
) -> ActionResponse {
    let tree_name = match normalize_tree_name(&tree_name) {
        Ok(tree_name) => tree_name,
        Err(err) => return ActionResponse::failure(format!("tree_new failed: {err}")),
    };
    let gender = match parse_gender(&gender) {
        Ok(gender) => gender,
        Err(message) => return ActionResponse::failure(message),
    };
    let mut person = NewPerson::new(name, gender);
    person.birth_year = birth_year;

    with_session(|session| match session.store.create_root(person) {
        Ok(id) => {
            session.tree_name = Some(tree_name);
            ActionResponse::success("New family tree started.", Some(id.to_string()))
        }
        Err(err) => ActionResponse::failure(format!("tree_new failed: {err}")),
    })
}

/// Adds a person related to `center_id`.
///
/// `kind` uses the wire names (`spouse`, `adoptedChild`,
/// `identicalMultipleBirth`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn person_attach(
    center_id: String,
    kind: String,
    name: String,
    birth_year: Option<String>,
    gender: String,
    is_deceased: bool,
) -> ActionResponse {
    let Some(kind) = AttachKind::parse(kind.trim()) else {
        return ActionResponse::failure(format!("unknown relationship kind `{kind}`"));
    };
    let gender = match parse_gender(&gender) {
        Ok(gender) => gender,
        Err(message) => return ActionResponse::failure(message),
    };
    let mut person = NewPerson::new(name, gender);
    person.birth_year = birth_year;
    person.is_deceased = is_deceased;

    with_session(|session| {
        match session
            .store
            .attach(person, &PersonId::new(center_id), kind)
        {
            Ok(id) => ActionResponse::success("Person added.", Some(id.to_string())),
            Err(err) => ActionResponse::failure(format!("person_attach failed: {err}")),
        }
    })
}

/// Updates person attributes; `None` arguments stay unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn person_update(
    id: String,
    name: Option<String>,
    birth_year: Option<String>,
    gender: Option<String>,
    is_deceased: Option<bool>,
) -> ActionResponse {
    let gender = match gender.as_deref().map(parse_gender).transpose() {
        Ok(gender) => gender,
        Err(message) => return ActionResponse::failure(message),
    };
    let patch = PersonPatch {
        name,
        birth_year,
        gender,
        is_deceased,
    };
    with_session(|session| {
        command_response(
            session.store.update_person(&PersonId::new(id), patch),
            "Person updated.",
            "person_update",
        )
    })
}

/// Deletes a person and clears every link to it. The root is protected.
#[flutter_rust_bridge::frb(sync)]
pub fn person_delete(id: String) -> ActionResponse {
    with_session(|session| {
        command_response(
            session.store.delete_person(&PersonId::new(id)),
            "Person deleted.",
            "person_delete",
        )
    })
}

/// Moves people by a delta as one undoable step.
#[flutter_rust_bridge::frb(sync)]
pub fn person_move(ids: Vec<String>, dx: f64, dy: f64) -> ActionResponse {
    let ids: Vec<PersonId> = ids.into_iter().map(PersonId::new).collect();
    with_session(|session| {
        command_response(
            session.store.reposition(&ids, dx, dy),
            "Moved.",
            "person_move",
        )
    })
}

/// Starts a node drag. `group=true` drags the whole multiple-birth group.
#[flutter_rust_bridge::frb(sync)]
pub fn drag_begin(id: String, x: f64, y: f64, group: bool) -> ActionResponse {
    let mode = if group {
        DragMode::Group
    } else {
        DragMode::Spacing
    };
    with_session(|session| {
        command_response(
            session
                .store
                .begin_drag(&PersonId::new(id), Point::new(x, y), mode),
            "Drag started.",
            "drag_begin",
        )
    })
}

/// Feeds one pointer sample to the active drag.
#[flutter_rust_bridge::frb(sync)]
pub fn drag_update(x: f64, y: f64) -> ActionResponse {
    with_session(|session| match session.store.drag_to(Point::new(x, y)) {
        Ok(moved) => ActionResponse::success(format!("{moved} moved."), None),
        Err(err) => ActionResponse::failure(format!("drag_update failed: {err}")),
    })
}

/// Ends the active drag, recording one undo step if anything moved.
#[flutter_rust_bridge::frb(sync)]
pub fn drag_end() -> ActionResponse {
    with_session(|session| match session.store.end_drag() {
        Ok(true) => ActionResponse::success("Drag finished.", None),
        Ok(false) => ActionResponse::success("Drag cancelled.", None),
        Err(err) => ActionResponse::failure(format!("drag_end failed: {err}")),
    })
}

/// Adds an emotional relationship line, e.g. `conflict-two`.
#[flutter_rust_bridge::frb(sync)]
pub fn line_add(line_type: String, x1: f64, y1: f64, x2: f64, y2: f64) -> ActionResponse {
    let Some(line_type) = LineType::parse(line_type.trim()) else {
        return ActionResponse::failure(format!("unknown line type `{line_type}`"));
    };
    with_session(|session| {
        match session
            .store
            .add_line(line_type, Point::new(x1, y1), Point::new(x2, y2))
        {
            Ok(id) => ActionResponse::success("Line added.", Some(id)),
            Err(err) => ActionResponse::failure(format!("line_add failed: {err}")),
        }
    })
}

/// Moves a line handle (`start`, `end` or `body`) by a delta.
#[flutter_rust_bridge::frb(sync)]
pub fn line_move(id: String, handle: String, dx: f64, dy: f64) -> ActionResponse {
    let Some(handle) = parse_handle(&handle) else {
        return ActionResponse::failure(format!("unknown line handle `{handle}`"));
    };
    with_session(|session| {
        command_response(
            session.store.move_line(&id, handle, dx, dy),
            "Line moved.",
            "line_move",
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_set_type(id: String, line_type: String) -> ActionResponse {
    let Some(line_type) = LineType::parse(line_type.trim()) else {
        return ActionResponse::failure(format!("unknown line type `{line_type}`"));
    };
    with_session(|session| {
        command_response(
            session.store.set_line_type(&id, line_type),
            "Line updated.",
            "line_set_type",
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn line_delete(id: String) -> ActionResponse {
    with_session(|session| {
        command_response(
            session.store.delete_line(&id),
            "Line deleted.",
            "line_delete",
        )
    })
}

/// Restores the previous snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn edit_undo() -> ActionResponse {
    with_session(|session| {
        command_response(session.store.undo(), "Undone.", "edit_undo")
    })
}

/// Current tree records as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_snapshot_json() -> JsonResponse {
    with_session(|session| JsonResponse::from_value(session.store.snapshot()))
}

/// Derived draw list (connectors, nodes, overlays) as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn scene_json() -> JsonResponse {
    with_session(|session| {
        let scene = render_scene(session.store.snapshot(), session.store.layout_config());
        JsonResponse::from_value(&scene)
    })
}

/// Raster export request (`png`, `jpeg` or `jpg`) as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn export_request_json(format: String) -> JsonResponse {
    let format = match ImageFormat::parse(&format) {
        Ok(format) => format,
        Err(err) => return JsonResponse::failure(err.to_string()),
    };
    with_session(|session| {
        match export_request(
            &session.store.snapshot().people,
            format,
            session.store.layout_config(),
        ) {
            Some(request) => JsonResponse::from_value(&request),
            None => JsonResponse::failure("Nothing to export."),
        }
    })
}

/// Lists saved tree names.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_list() -> TreeListResponse {
    match with_tree_service(|service| service.list_trees()) {
        Ok(names) => {
            let message = format!("{} saved tree(s).", names.len());
            TreeListResponse { names, message }
        }
        Err(err) => TreeListResponse {
            names: Vec::new(),
            message: format!("tree_list failed: {err}"),
        },
    }
}

/// Saves the session tree under `tree_name`, or the session's current name
/// when `tree_name` is blank.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_save(tree_name: String) -> ActionResponse {
    with_session(|session| {
        let name = if tree_name.trim().is_empty() {
            session.tree_name.clone().unwrap_or_default()
        } else {
            tree_name.trim().to_string()
        };
        let snapshot = session.store.snapshot();
        match with_tree_service(|service| service.save_tree(&name, snapshot)) {
            Ok(message) => {
                session.tree_name = Some(name);
                ActionResponse::success(message, None)
            }
            Err(err) => ActionResponse::failure(format!("tree_save failed: {err}")),
        }
    })
}

/// Loads a saved tree into the session, resetting undo history.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_load(tree_name: String) -> ActionResponse {
    with_session(|session| {
        match with_tree_service(|service| service.open_in(&tree_name, &mut session.store)) {
            Ok(()) => {
                session.tree_name = Some(tree_name.trim().to_string());
                let root = session
                    .store
                    .snapshot()
                    .root_id
                    .as_ref()
                    .map(ToString::to_string);
                ActionResponse::success("Family tree loaded.", root)
            }
            Err(err) => ActionResponse::failure(format!("tree_load failed: {err}")),
        }
    })
}

/// Deletes a saved tree.
#[flutter_rust_bridge::frb(sync)]
pub fn tree_delete(tree_name: String) -> ActionResponse {
    match with_tree_service(|service| service.delete_tree(&tree_name)) {
        Ok(message) => ActionResponse::success(message, None),
        Err(err) => ActionResponse::failure(format!("tree_delete failed: {err}")),
    }
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> T {
    let mutex = SESSION.get_or_init(|| Mutex::new(Session::default()));
    let mut guard: MutexGuard<'_, Session> = mutex.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered reason=poisoned");
        PoisonError::into_inner(poisoned)
    });
    f(&mut guard)
}

fn with_tree_service<T>(
    f: impl FnOnce(&TreeService<SqliteTreeRepository<'_>>) -> Result<T, TreeServiceError>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("tree DB open failed: {err}"))?;
    let repo =
        SqliteTreeRepository::try_new(&conn).map_err(|err| format!("tree repo init failed: {err}"))?;
    let service = TreeService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn command_response<E: std::fmt::Display>(
    result: Result<(), E>,
    success: &str,
    operation: &str,
) -> ActionResponse {
    match result {
        Ok(()) => ActionResponse::success(success, None),
        Err(err) => ActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    Gender::parse(value.trim()).ok_or_else(|| format!("unknown gender `{value}`"))
}

fn parse_handle(value: &str) -> Option<LineHandle> {
    match value.trim() {
        "start" => Some(LineHandle::Start),
        "end" => Some(LineHandle::End),
        "body" => Some(LineHandle::Body),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, drag_begin, drag_end, drag_update, edit_undo, export_request_json,
        init_logging, line_add, line_delete, parse_handle, person_attach, person_delete, ping,
        scene_json, tree_delete, tree_list, tree_load, tree_new, tree_save, tree_snapshot_json,
    };
    use famtree_core::LineHandle;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn handles_parse_from_wire_names() {
        assert_eq!(parse_handle("body"), Some(LineHandle::Body));
        assert_eq!(parse_handle("middle"), None);
    }

    #[test]
    fn tree_new_requires_a_tree_name() {
        let blank = tree_new("  ".into(), "Root".into(), None, "male".into());
        assert!(!blank.ok);
        assert!(blank.id.is_none());
        assert!(blank.message.contains("tree name"), "{}", blank.message);
    }

    // The session is process-wide, so the whole editing flow lives in one test.
    #[test]
    fn session_flow_edits_saves_and_reloads() {
        let tree_name = unique_token("ffi-flow");

        let root = tree_new(tree_name.clone(), "Root".into(), None, "male".into());
        assert!(root.ok, "{}", root.message);
        let root_id = root.id.clone().unwrap();

        let bad_kind = person_attach(
            root_id.clone(),
            "cousin".into(),
            "X".into(),
            None,
            "female".into(),
            false,
        );
        assert!(!bad_kind.ok);

        let spouse = person_attach(
            root_id.clone(),
            "spouse".into(),
            "Partner".into(),
            Some("1960".into()),
            "female".into(),
            false,
        );
        assert!(spouse.ok, "{}", spouse.message);

        let protected = person_delete(root_id.clone());
        assert!(!protected.ok);

        let line = line_add("distant-one".into(), 0.0, 0.0, 50.0, 50.0);
        assert!(line.ok, "{}", line.message);
        assert!(line_delete(line.id.unwrap()).ok);
        assert!(edit_undo().ok);

        assert!(drag_begin(root_id.clone(), 0.0, 0.0, true).ok);
        assert!(drag_update(40.0, 1.0).ok);
        assert!(drag_end().ok);

        let scene = scene_json();
        assert!(scene.ok);
        assert!(scene.json.contains("\"spouse\""));
        let export = export_request_json("jpg".into());
        assert!(export.ok, "{}", export.message);
        assert!(!export_request_json("gif".into()).ok);

        let saved = tree_save(String::new());
        assert!(saved.ok, "{}", saved.message);
        assert!(tree_list().names.contains(&tree_name));

        let loaded = tree_load(tree_name.clone());
        assert!(loaded.ok, "{}", loaded.message);
        assert_eq!(loaded.id.as_deref(), Some(root_id.as_str()));
        assert!(tree_snapshot_json().json.contains("distant-one"));

        assert!(tree_delete(tree_name.clone()).ok);
        let missing = tree_delete(tree_name);
        assert!(missing.ok);
        assert!(missing.message.contains("no family tree"));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        format!("{prefix}-{nanos}")
    }
}
