//! Entity store and relationship editor.
//!
//! # Responsibility
//! - Own the canonical tree of one editing session.
//! - Expose `snapshot()` as the only read entry and `apply()` as the only
//!   write entry for structural commands.
//! - Keep the undo history and the active drag session.
//!
//! # Invariants
//! - Every command runs against a working copy that is validated with
//!   `FamilyTree::check_invariants` before it replaces the live tree.
//! - A failed command leaves both tree and history untouched.
//! - The newest history snapshot equals the live tree whenever no drag is in
//!   progress.

pub mod attach;
pub mod command;
pub mod drag;
pub mod history;

use crate::config::{EditorConfig, LayoutConfig};
use crate::layout::connectors::Point;
use crate::model::person::{Gender, NodeType, PersonId};
use crate::model::relationship_line::{LineHandle, LineType, RelationshipLine};
use crate::model::tree::{FamilyTree, TreeIntegrityError};
use crate::model::validation::ValidationError;
use command::{normalize_year, AttachKind, EditCommand, EditOutcome, NewPerson, PersonPatch};
use drag::{DragMode, DragSession};
use history::HistoryLog;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Editor command failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Validation(ValidationError),
    /// The root person cannot be deleted.
    ProtectedEntity(PersonId),
    /// A command referenced an absent person or line.
    NotFound { entity: &'static str, id: String },
    /// The command would break a cross-record invariant.
    InvariantViolation(TreeIntegrityError),
    NothingToUndo,
    NoActiveDrag,
}

impl EditorError {
    fn person_not_found(id: &PersonId) -> Self {
        Self::NotFound {
            entity: "person",
            id: id.to_string(),
        }
    }

    fn line_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "line",
            id: id.to_string(),
        }
    }
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProtectedEntity(id) => write!(f, "root person cannot be deleted: {id}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvariantViolation(err) => write!(f, "edit rejected: {err}"),
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NoActiveDrag => write!(f, "no drag in progress"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvariantViolation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for EditorError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TreeIntegrityError> for EditorError {
    fn from(value: TreeIntegrityError) -> Self {
        Self::InvariantViolation(value)
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Canonical tree plus history for one editing session.
#[derive(Debug, Clone)]
pub struct TreeStore {
    tree: FamilyTree,
    history: HistoryLog,
    layout: LayoutConfig,
    editor: EditorConfig,
    drag: Option<DragSession>,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), EditorConfig::default())
    }
}

impl TreeStore {
    /// Creates an empty store. Call `create_root` or `replace_tree` next.
    pub fn new(layout: LayoutConfig, editor: EditorConfig) -> Self {
        Self {
            tree: FamilyTree::default(),
            history: HistoryLog::new(editor.history_depth),
            layout,
            editor,
            drag: None,
        }
    }

    /// Current committed state.
    pub fn snapshot(&self) -> &FamilyTree {
        &self.tree
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Replaces the live tree with a loaded one and reseeds history.
    pub fn replace_tree(&mut self, tree: FamilyTree) -> EditorResult<()> {
        tree.check_invariants()?;
        self.drag = None;
        self.tree = tree;
        self.history.clear();
        self.history.record(self.tree.clone());
        info!(
            "event=tree_replace module=editor status=ok people={} lines={}",
            self.tree.people.len(),
            self.tree.lines.len()
        );
        Ok(())
    }

    /// Applies one command atomically and records a history snapshot.
    /// Commands that change nothing leave the tree and history untouched.
    ///
    /// # Errors
    /// - Any validation or invariant failure; the store stays unchanged.
    pub fn apply(&mut self, command: EditCommand) -> EditorResult<EditOutcome> {
        self.finish_drag();
        let event = command.event_name();
        let resets_history = matches!(command, EditCommand::CreateRoot(_));

        let mut working = if resets_history {
            FamilyTree::default()
        } else {
            self.tree.clone()
        };
        let result = execute(&mut working, command, &self.layout)
            .and_then(|outcome| working.check_invariants().map(|_| outcome).map_err(Into::into));

        match result {
            Ok(EditOutcome::Unchanged) => {
                debug!("event={event} module=editor status=skipped reason=no_change");
                Ok(EditOutcome::Unchanged)
            }
            Ok(outcome) => {
                self.tree = working;
                if resets_history {
                    self.history.clear();
                }
                self.history.record(self.tree.clone());
                info!(
                    "event={event} module=editor status=ok people={}",
                    self.tree.people.len()
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("event={event} module=editor status=rejected error={err}");
                Err(err)
            }
        }
    }

    pub fn create_root(&mut self, person: NewPerson) -> EditorResult<PersonId> {
        match self.apply(EditCommand::CreateRoot(person))? {
            EditOutcome::PersonCreated(id) => Ok(id),
            _ => Err(ValidationError::NoRoot.into()),
        }
    }

    pub fn attach(
        &mut self,
        person: NewPerson,
        center: &PersonId,
        kind: AttachKind,
    ) -> EditorResult<PersonId> {
        let outcome = self.apply(EditCommand::Attach {
            person,
            center: center.clone(),
            kind,
        })?;
        match outcome {
            EditOutcome::PersonCreated(id) => Ok(id),
            _ => Err(ValidationError::UnresolvedCenter(center.to_string()).into()),
        }
    }

    pub fn update_person(&mut self, id: &PersonId, patch: PersonPatch) -> EditorResult<()> {
        self.apply(EditCommand::UpdatePerson {
            id: id.clone(),
            patch,
        })
        .map(|_| ())
    }

    pub fn delete_person(&mut self, id: &PersonId) -> EditorResult<()> {
        self.apply(EditCommand::DeletePerson(id.clone())).map(|_| ())
    }

    pub fn reposition(&mut self, ids: &[PersonId], dx: f64, dy: f64) -> EditorResult<()> {
        self.apply(EditCommand::Reposition {
            ids: ids.to_vec(),
            dx,
            dy,
        })
        .map(|_| ())
    }

    pub fn add_line(&mut self, line_type: LineType, start: Point, end: Point) -> EditorResult<String> {
        match self.apply(EditCommand::AddLine {
            line_type,
            start,
            end,
        })? {
            EditOutcome::LineCreated(id) => Ok(id),
            _ => Err(EditorError::line_not_found("")),
        }
    }

    pub fn move_line(&mut self, id: &str, handle: LineHandle, dx: f64, dy: f64) -> EditorResult<()> {
        self.apply(EditCommand::MoveLine {
            id: id.to_string(),
            handle,
            dx,
            dy,
        })
        .map(|_| ())
    }

    pub fn set_line_type(&mut self, id: &str, line_type: LineType) -> EditorResult<()> {
        self.apply(EditCommand::SetLineType {
            id: id.to_string(),
            line_type,
        })
        .map(|_| ())
    }

    pub fn delete_line(&mut self, id: &str) -> EditorResult<()> {
        self.apply(EditCommand::DeleteLine(id.to_string())).map(|_| ())
    }

    /// Restores the previous snapshot.
    pub fn undo(&mut self) -> EditorResult<()> {
        self.finish_drag();
        let Some(previous) = self.history.undo() else {
            return Err(EditorError::NothingToUndo);
        };
        self.tree = previous.clone();
        info!(
            "event=edit_undo module=editor status=ok remaining={}",
            self.history.len()
        );
        Ok(())
    }

    /// Starts dragging `target`. Group mode also drags every member of the
    /// target's multiple-birth group.
    pub fn begin_drag(&mut self, target: &PersonId, origin: Point, mode: DragMode) -> EditorResult<()> {
        self.finish_drag();
        let person = self
            .tree
            .person(target)
            .ok_or_else(|| EditorError::person_not_found(target))?;

        let mut members = vec![(person.id.clone(), Point::new(person.x, person.y))];
        if let (DragMode::Group, Some(group)) = (mode, person.multiple_birth_group_id.as_deref()) {
            members.extend(
                self.tree
                    .people
                    .iter()
                    .filter(|p| p.id != person.id)
                    .filter(|p| p.multiple_birth_group_id.as_deref() == Some(group))
                    .map(|p| (p.id.clone(), Point::new(p.x, p.y))),
            );
        }

        self.drag = Some(DragSession::new(
            mode,
            origin,
            self.editor.drag_deadzone,
            members,
        ));
        Ok(())
    }

    /// Feeds one pointer sample; returns how many people moved.
    pub fn drag_to(&mut self, pointer: Point) -> EditorResult<usize> {
        let session = self.drag.as_mut().ok_or(EditorError::NoActiveDrag)?;
        let positions = session.update(pointer);
        for (id, position) in &positions {
            if let Some(person) = self.tree.person_mut(id) {
                person.x = position.x;
                person.y = position.y;
            }
        }
        Ok(positions.len())
    }

    /// Ends the drag; returns whether anything moved.
    pub fn end_drag(&mut self) -> EditorResult<bool> {
        if self.drag.is_none() {
            return Err(EditorError::NoActiveDrag);
        }
        Ok(self.finish_drag())
    }

    fn finish_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        let moved = session.has_moved();
        if moved {
            self.history.record(self.tree.clone());
            info!(
                "event=drag_end module=editor status=ok people={}",
                session.member_ids().count()
            );
        }
        moved
    }
}

fn execute(
    tree: &mut FamilyTree,
    command: EditCommand,
    layout: &LayoutConfig,
) -> EditorResult<EditOutcome> {
    match command {
        EditCommand::CreateRoot(person) => {
            let root = person.into_person();
            root.validate().map_err(ValidationError::from)?;
            let id = root.id.clone();
            *tree = FamilyTree::with_root(root);
            Ok(EditOutcome::PersonCreated(id))
        }
        EditCommand::Attach {
            person,
            center,
            kind,
        } => {
            let id = attach::attach(tree, person.into_person(), &center, kind, layout)?;
            Ok(EditOutcome::PersonCreated(id))
        }
        EditCommand::UpdatePerson { id, patch } => {
            update_person(tree, &id, patch)?;
            Ok(EditOutcome::Changed)
        }
        EditCommand::DeletePerson(id) => {
            delete_person(tree, &id)?;
            Ok(EditOutcome::Changed)
        }
        EditCommand::Reposition { ids, dx, dy } => {
            let unique: HashSet<PersonId> = ids.into_iter().collect();
            if let Some(missing) = unique.iter().find(|id| !tree.contains(id)) {
                return Err(EditorError::person_not_found(missing));
            }
            if unique.is_empty() || (dx == 0.0 && dy == 0.0) {
                return Ok(EditOutcome::Unchanged);
            }
            for id in &unique {
                if let Some(person) = tree.person_mut(id) {
                    person.x += dx;
                    person.y += dy;
                }
            }
            Ok(EditOutcome::Changed)
        }
        EditCommand::AddLine {
            line_type,
            start,
            end,
        } => {
            let line = RelationshipLine::new(line_type, start.x, start.y, end.x, end.y);
            let id = line.id.clone();
            tree.lines.push(line);
            Ok(EditOutcome::LineCreated(id))
        }
        EditCommand::MoveLine { id, handle, dx, dy } => {
            tree.line_mut(&id)
                .ok_or_else(|| EditorError::line_not_found(&id))?
                .translate(handle, dx, dy);
            Ok(EditOutcome::Changed)
        }
        EditCommand::SetLineType { id, line_type } => {
            tree.line_mut(&id)
                .ok_or_else(|| EditorError::line_not_found(&id))?
                .line_type = line_type;
            Ok(EditOutcome::Changed)
        }
        EditCommand::DeleteLine(id) => {
            let before = tree.lines.len();
            tree.lines.retain(|line| line.id != id);
            if tree.lines.len() == before {
                return Err(EditorError::line_not_found(&id));
            }
            Ok(EditOutcome::Changed)
        }
    }
}

fn update_person(tree: &mut FamilyTree, id: &PersonId, patch: PersonPatch) -> EditorResult<()> {
    let person = tree
        .person_mut(id)
        .ok_or_else(|| EditorError::person_not_found(id))?;
    if let Some(name) = patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        person.name = name.to_string();
    }
    if let Some(year) = patch.birth_year {
        person.birth_year = normalize_year(Some(year));
    }
    if let Some(gender) = patch.gender {
        person.gender = gender;
        person.node_type = if gender == Gender::Pet {
            NodeType::Pet
        } else {
            NodeType::Person
        };
    }
    if let Some(is_deceased) = patch.is_deceased {
        person.is_deceased = is_deceased;
    }
    Ok(())
}

/// Removes `id` and clears every reference other people hold to it.
fn delete_person(tree: &mut FamilyTree, id: &PersonId) -> EditorResult<()> {
    if tree.is_root(id) {
        return Err(EditorError::ProtectedEntity(id.clone()));
    }
    if !tree.contains(id) {
        return Err(EditorError::person_not_found(id));
    }
    for person in &mut tree.people {
        if person.real_parent_id() == Some(id) {
            person.parent = None;
        }
        if person.spouse_id.as_ref() == Some(id) {
            person.spouse_id = None;
        }
        if person.next_identical_sibling_id.as_ref() == Some(id) {
            person.next_identical_sibling_id = None;
        }
    }
    tree.people.retain(|person| &person.id != id);
    Ok(())
}
