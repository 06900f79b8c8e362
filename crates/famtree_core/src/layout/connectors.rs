//! Connector geometry generator.
//!
//! # Responsibility
//! - Turn resolver output plus current person positions into drawables.
//! - Tag every drawable with stroke style, color class and arrow heads.
//!
//! # Invariants
//! - Output is regenerated from scratch on every call; nothing is cached, so
//!   repeated calls after a drag only move geometry, never duplicate it.
//! - Derived connectors render behind nodes; emotional lines render above.

use crate::config::LayoutConfig;
use crate::layout::resolver::{resolve, AnchorParents, ResolvedTree, SiblingGroup};
use crate::layout::shape::{node_shape, NodeShape};
use crate::model::person::{Person, PersonId, RelationshipType};
use crate::model::relationship_line::{LineArrows, LineTone, RelationshipLine};
use crate::model::tree::FamilyTree;
use serde::Serialize;

const MARK_HALF_WIDTH: f64 = 4.0;
const MARK_HALF_HEIGHT: f64 = 6.0;
const DIVORCE_MARK_OFFSET: f64 = 3.0;
const CLUSTER_DROP: f64 = 1.0;
const ZIGZAG_MIN_LENGTH: f64 = 10.0;
const ZIGZAG_PADDING: f64 = 15.0;
const ZIGZAG_AMPLITUDE: f64 = 6.0;
const ZIGZAG_WAVELENGTH: f64 = 12.0;
const ARROW_SIZE: f64 = 10.0;
const ARROW_ANGLE_DEGREES: f64 = 30.0;
const ARROW_MIN_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Zigzag,
}

/// Semantic color bucket; the renderer maps it to a concrete color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorClass {
    Kin,
    Intimate,
    Distant,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorKind {
    /// Orthogonal marriage path between partners.
    Spouse,
    /// Divorce/separation tick on a marriage line.
    MarriageMark,
    /// Vertical line from parents to the sibling bar or a single child.
    ParentDrop,
    /// Horizontal segment between two cluster midpoints.
    SiblingBar,
    /// Short vertical stub below the bar for one cluster.
    ClusterDrop,
    /// Fan-out line from a cluster stub to one child.
    SiblingLeg,
    IdenticalTwin,
    Emotional,
}

/// Filled triangle; `tip` touches the line end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrowHead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

/// One drawable polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub kind: ConnectorKind,
    pub points: Vec<Point>,
    pub style: StrokeStyle,
    pub color: ColorClass,
    pub arrow_heads: Vec<ArrowHead>,
}

impl Connector {
    fn kin(kind: ConnectorKind, points: Vec<Point>, dashed: bool) -> Self {
        Self {
            kind,
            points,
            style: if dashed {
                StrokeStyle::Dashed
            } else {
                StrokeStyle::Solid
            },
            color: ColorClass::Kin,
            arrow_heads: Vec::new(),
        }
    }

    fn segment(kind: ConnectorKind, from: Point, to: Point, dashed: bool) -> Self {
        Self::kin(kind, vec![from, to], dashed)
    }
}

/// Person node as the renderer should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGlyph {
    pub person_id: PersonId,
    pub center: Point,
    pub shape: NodeShape,
    pub label: String,
    /// Birth year caption; pets never carry one.
    pub caption: Option<String>,
    pub is_root: bool,
}

/// Draw list in back-to-front order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Derived kinship connectors, drawn behind nodes.
    pub connectors: Vec<Connector>,
    pub nodes: Vec<NodeGlyph>,
    /// Emotional relationship lines, drawn above nodes.
    pub overlays: Vec<Connector>,
}

impl Scene {
    pub fn connectors_of(&self, kind: ConnectorKind) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(move |c| c.kind == kind)
    }
}

/// Resolves and generates in one step.
pub fn render_scene(tree: &FamilyTree, config: &LayoutConfig) -> Scene {
    let resolved = resolve(tree);
    generate(tree, &resolved, config)
}

/// Generates the full draw list for `tree`.
pub fn generate(tree: &FamilyTree, resolved: &ResolvedTree, config: &LayoutConfig) -> Scene {
    let mut connectors = Vec::new();

    for pair in &resolved.spouse_pairs {
        if let (Some(p1), Some(p2)) = (tree.person(&pair.first), tree.person(&pair.second)) {
            spouse_connector(p1, p2, config, &mut connectors);
        }
    }
    for link in &resolved.twin_links {
        if let (Some(a), Some(b)) = (tree.person(&link.from), tree.person(&link.to)) {
            connectors.push(Connector::segment(
                ConnectorKind::IdenticalTwin,
                Point::new(a.x + config.half_width(), a.y),
                Point::new(b.x - config.half_width(), b.y),
                false,
            ));
        }
    }
    for group in &resolved.sibling_groups {
        family_connectors(tree, group, config, &mut connectors);
    }

    let nodes = tree
        .people
        .iter()
        .map(|person| NodeGlyph {
            person_id: person.id.clone(),
            center: Point::new(person.x, person.y),
            shape: node_shape(person.gender, person.node_type, person.is_deceased, config),
            label: person.name.clone(),
            caption: if person.is_pet() {
                None
            } else {
                person.birth_year.as_ref().map(|year| format!("({year})"))
            },
            is_root: tree.is_root(&person.id),
        })
        .collect();

    let overlays = tree.lines.iter().map(emotional_connector).collect();

    Scene {
        connectors,
        nodes,
        overlays,
    }
}

fn spouse_connector(p1: &Person, p2: &Person, config: &LayoutConfig, out: &mut Vec<Connector>) {
    let marriage_y = p1.y + config.half_height() + config.marriage_drop;
    let relation = p1.relationship_type.or(p2.relationship_type);

    out.push(Connector::kin(
        ConnectorKind::Spouse,
        vec![
            Point::new(p1.x, p1.y + config.half_height()),
            Point::new(p1.x, marriage_y),
            Point::new(p2.x, marriage_y),
            Point::new(p2.x, p2.y + config.half_height()),
        ],
        relation == Some(RelationshipType::Cohabitant),
    ));

    let mid_x = (p1.x + p2.x) / 2.0;
    let offsets: &[f64] = match relation {
        Some(RelationshipType::Separation) => &[0.0],
        Some(RelationshipType::Divorce) => &[-DIVORCE_MARK_OFFSET, DIVORCE_MARK_OFFSET],
        _ => &[],
    };
    for offset in offsets {
        let x = mid_x + offset;
        out.push(Connector::segment(
            ConnectorKind::MarriageMark,
            Point::new(x - MARK_HALF_WIDTH, marriage_y + MARK_HALF_HEIGHT),
            Point::new(x + MARK_HALF_WIDTH, marriage_y - MARK_HALF_HEIGHT),
            false,
        ));
    }
}

fn family_connectors(
    tree: &FamilyTree,
    group: &SiblingGroup,
    config: &LayoutConfig,
    out: &mut Vec<Connector>,
) {
    let children: Vec<&Person> = group
        .children
        .iter()
        .filter_map(|id| tree.person(id))
        .collect();
    let Some(min_child_y) = children.iter().map(|child| child.y).min_by(f64::total_cmp) else {
        return;
    };
    let bar_y = min_child_y - config.half_height() - config.sibling_bar_gap;

    if let Some(start) = parent_anchor_point(tree, &group.parents, config) {
        if let [only_child] = children.as_slice() {
            out.push(Connector::segment(
                ConnectorKind::ParentDrop,
                start,
                Point::new(start.x, only_child.y - config.half_height()),
                is_adopted(only_child),
            ));
            return;
        }
        out.push(Connector::segment(
            ConnectorKind::ParentDrop,
            start,
            Point::new(start.x, bar_y),
            false,
        ));
    } else if children.len() == 1 {
        return;
    }

    let clusters: Vec<Vec<&Person>> = group
        .clusters
        .iter()
        .map(|cluster| cluster.iter().filter_map(|id| tree.person(id)).collect::<Vec<_>>())
        .filter(|cluster| !cluster.is_empty())
        .collect();
    let midpoints: Vec<f64> = clusters.iter().map(|cluster| cluster_mid_x(cluster)).collect();

    for pair in midpoints.windows(2) {
        out.push(Connector::segment(
            ConnectorKind::SiblingBar,
            Point::new(pair[0], bar_y),
            Point::new(pair[1], bar_y),
            false,
        ));
    }

    for (cluster, mid_x) in clusters.iter().zip(midpoints) {
        let adopted = is_adopted(cluster[0]);
        let fork = Point::new(mid_x, bar_y + CLUSTER_DROP);
        out.push(Connector::segment(
            ConnectorKind::ClusterDrop,
            Point::new(mid_x, bar_y),
            fork,
            adopted,
        ));
        for member in cluster {
            out.push(Connector::segment(
                ConnectorKind::SiblingLeg,
                fork,
                Point::new(member.x, member.y - config.half_height()),
                adopted,
            ));
        }
    }
}

/// Point where the parent line leaves the parents; `None` for virtual anchors.
fn parent_anchor_point(
    tree: &FamilyTree,
    parents: &AnchorParents,
    config: &LayoutConfig,
) -> Option<Point> {
    match parents {
        AnchorParents::Couple {
            representative,
            partner,
        } => {
            let rep = tree.person(representative)?;
            let partner = tree.person(partner)?;
            Some(Point::new(
                (rep.x + partner.x) / 2.0,
                rep.y + config.half_height() + config.marriage_drop,
            ))
        }
        AnchorParents::Single(parent_id) => {
            let parent = tree.person(parent_id)?;
            Some(Point::new(parent.x, parent.y + config.half_height()))
        }
        AnchorParents::Virtual => None,
    }
}

fn cluster_mid_x(cluster: &[&Person]) -> f64 {
    match (cluster.first(), cluster.last()) {
        (Some(first), Some(last)) => (first.x + last.x) / 2.0,
        _ => 0.0,
    }
}

fn is_adopted(person: &Person) -> bool {
    person.relationship_type == Some(RelationshipType::AdoptedChild)
}

fn emotional_connector(line: &RelationshipLine) -> Connector {
    let start = Point::new(line.x1, line.y1);
    let end = Point::new(line.x2, line.y2);
    let (style, color, points) = match line.line_type.tone {
        LineTone::Intimate => (StrokeStyle::Solid, ColorClass::Intimate, vec![start, end]),
        LineTone::Distant => (StrokeStyle::Dashed, ColorClass::Distant, vec![start, end]),
        LineTone::Conflict => (
            StrokeStyle::Zigzag,
            ColorClass::Conflict,
            zigzag_points(start, end),
        ),
    };

    Connector {
        kind: ConnectorKind::Emotional,
        points,
        style,
        color,
        arrow_heads: arrow_heads(start, end, line.line_type.arrows),
    }
}

/// Zigzag polyline with straight lead-in/lead-out segments.
pub fn zigzag_points(start: Point, end: Point) -> Vec<Point> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length < ZIGZAG_MIN_LENGTH || length <= ZIGZAG_PADDING * 2.0 {
        return vec![start, end];
    }

    let (ux, uy) = (dx / length, dy / length);
    let (vx, vy) = (-uy, ux);
    let lead_in = Point::new(start.x + ux * ZIGZAG_PADDING, start.y + uy * ZIGZAG_PADDING);

    let zigzag_length = length - ZIGZAG_PADDING * 2.0;
    let waves = (zigzag_length / ZIGZAG_WAVELENGTH).floor() as usize;
    if waves < 1 {
        return vec![start, lead_in, end];
    }
    let wavelength = zigzag_length / waves as f64;

    let mut points = vec![start, lead_in];
    for step in 0..=(waves * 2) {
        let distance = ZIGZAG_PADDING + step as f64 * (wavelength / 2.0);
        let offset = match step % 4 {
            1 => ZIGZAG_AMPLITUDE,
            3 => -ZIGZAG_AMPLITUDE,
            _ => 0.0,
        };
        points.push(Point::new(
            start.x + ux * distance + vx * offset,
            start.y + uy * distance + vy * offset,
        ));
    }
    points.push(end);
    points
}

/// Arrow heads for a line; `Two` marks both ends, `One` only the end point.
pub fn arrow_heads(start: Point, end: Point, arrows: LineArrows) -> Vec<ArrowHead> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length < ARROW_MIN_LENGTH {
        return Vec::new();
    }
    let (ux, uy) = (dx / length, dy / length);

    match arrows {
        LineArrows::One => vec![arrow_head(end, ux, uy)],
        LineArrows::Two => vec![arrow_head(start, -ux, -uy), arrow_head(end, ux, uy)],
    }
}

fn arrow_head(tip: Point, ux: f64, uy: f64) -> ArrowHead {
    let angle = ARROW_ANGLE_DEGREES.to_radians();
    let (sin, cos) = angle.sin_cos();
    ArrowHead {
        tip,
        left: Point::new(
            tip.x - ARROW_SIZE * (ux * cos + uy * sin),
            tip.y - ARROW_SIZE * (uy * cos - ux * sin),
        ),
        right: Point::new(
            tip.x - ARROW_SIZE * (ux * cos - uy * sin),
            tip.y - ARROW_SIZE * (uy * cos + ux * sin),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        arrow_heads, render_scene, zigzag_points, ConnectorKind, Point, Scene, StrokeStyle,
    };
    use crate::config::LayoutConfig;
    use crate::model::person::{Gender, ParentRef, Person, PersonId, RelationshipType};
    use crate::model::relationship_line::LineArrows;
    use crate::model::tree::FamilyTree;

    fn at(id: &str, x: f64, y: f64) -> Person {
        let mut person = Person::with_id(PersonId::new(id), id.to_uppercase(), Gender::Female);
        person.x = x;
        person.y = y;
        person
    }

    fn married(mut a: Person, mut b: Person, relation: RelationshipType) -> [Person; 2] {
        a.spouse_id = Some(b.id.clone());
        b.spouse_id = Some(a.id.clone());
        b.relationship_type = Some(relation);
        [a, b]
    }

    fn child_of(mut child: Person, parent: &str) -> Person {
        child.parent = Some(ParentRef::Real(PersonId::new(parent)));
        child
    }

    fn adopted(mut child: Person) -> Person {
        child.relationship_type = Some(RelationshipType::AdoptedChild);
        child
    }

    fn scene(people: Vec<Person>) -> Scene {
        let tree = FamilyTree::from_records(people, Vec::new()).unwrap();
        render_scene(&tree, &LayoutConfig::default())
    }

    fn segment(scene: &Scene, kind: ConnectorKind) -> Vec<(Vec<Point>, StrokeStyle)> {
        scene
            .connectors_of(kind)
            .map(|c| (c.points.clone(), c.style))
            .collect()
    }

    #[test]
    fn marriage_line_hangs_below_the_first_partner() {
        let scene = scene(
            married(at("a", 0.0, 0.0), at("b", 110.0, 10.0), RelationshipType::Spouse).into(),
        );

        let spouse = segment(&scene, ConnectorKind::Spouse);
        assert_eq!(
            spouse,
            vec![(
                vec![
                    Point::new(0.0, 40.0),
                    Point::new(0.0, 60.0),
                    Point::new(110.0, 60.0),
                    Point::new(110.0, 50.0),
                ],
                StrokeStyle::Solid,
            )]
        );
        assert_eq!(scene.connectors_of(ConnectorKind::MarriageMark).count(), 0);
    }

    #[test]
    fn cohabitants_get_a_dashed_marriage_line() {
        let scene = scene(
            married(at("a", 0.0, 0.0), at("b", 110.0, 0.0), RelationshipType::Cohabitant).into(),
        );
        let spouse = segment(&scene, ConnectorKind::Spouse);
        assert_eq!(spouse.len(), 1);
        assert_eq!(spouse[0].1, StrokeStyle::Dashed);
        assert_eq!(scene.connectors_of(ConnectorKind::MarriageMark).count(), 0);
    }

    #[test]
    fn separation_marks_once_and_divorce_twice() {
        let separated = scene(
            married(at("a", 0.0, 0.0), at("b", 100.0, 0.0), RelationshipType::Separation).into(),
        );
        assert_eq!(
            segment(&separated, ConnectorKind::MarriageMark),
            vec![(
                vec![Point::new(46.0, 66.0), Point::new(54.0, 54.0)],
                StrokeStyle::Solid,
            )]
        );

        let divorced = scene(
            married(at("a", 0.0, 0.0), at("b", 100.0, 0.0), RelationshipType::Divorce).into(),
        );
        let ticks: Vec<Point> = divorced
            .connectors_of(ConnectorKind::MarriageMark)
            .map(|c| c.points[0])
            .collect();
        assert_eq!(ticks, vec![Point::new(43.0, 66.0), Point::new(49.0, 66.0)]);
        assert_eq!(
            segment(&divorced, ConnectorKind::Spouse)[0].1,
            StrokeStyle::Solid
        );
    }

    #[test]
    fn adopted_only_child_gets_a_dashed_drop() {
        let scene = scene(vec![
            at("a", 0.0, 0.0),
            adopted(child_of(at("c", 0.0, 140.0), "a")),
        ]);

        assert_eq!(
            segment(&scene, ConnectorKind::ParentDrop),
            vec![(
                vec![Point::new(0.0, 40.0), Point::new(0.0, 100.0)],
                StrokeStyle::Dashed,
            )]
        );
        assert_eq!(scene.connectors_of(ConnectorKind::SiblingBar).count(), 0);
        assert_eq!(scene.connectors_of(ConnectorKind::SiblingLeg).count(), 0);
    }

    #[test]
    fn adopted_cluster_is_dashed_while_birth_sibling_stays_solid() {
        let mut t1 = adopted(child_of(at("t1", -50.0, 140.0), "a"));
        let mut t2 = adopted(child_of(at("t2", 50.0, 140.0), "a"));
        t1.multiple_birth_group_id = Some("mb1".to_string());
        t2.multiple_birth_group_id = Some("mb1".to_string());
        let kid = child_of(at("k", 150.0, 140.0), "a");
        let scene = scene(vec![at("a", 0.0, 0.0), t1, t2, kid]);

        // Bar sits at 140 - 40 - 45.
        assert_eq!(
            segment(&scene, ConnectorKind::ParentDrop),
            vec![(
                vec![Point::new(0.0, 40.0), Point::new(0.0, 55.0)],
                StrokeStyle::Solid,
            )]
        );
        assert_eq!(
            segment(&scene, ConnectorKind::SiblingBar),
            vec![(
                vec![Point::new(0.0, 55.0), Point::new(150.0, 55.0)],
                StrokeStyle::Solid,
            )]
        );

        let drops = segment(&scene, ConnectorKind::ClusterDrop);
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[0].0[0], Point::new(0.0, 55.0));
        assert_eq!(drops[0].1, StrokeStyle::Dashed);
        assert_eq!(drops[1].0[0], Point::new(150.0, 55.0));
        assert_eq!(drops[1].1, StrokeStyle::Solid);

        let legs = segment(&scene, ConnectorKind::SiblingLeg);
        let styles: Vec<StrokeStyle> = legs.iter().map(|(_, style)| *style).collect();
        assert_eq!(
            styles,
            vec![StrokeStyle::Dashed, StrokeStyle::Dashed, StrokeStyle::Solid]
        );
        assert_eq!(legs[0].0[1], Point::new(-50.0, 100.0));
        assert_eq!(legs[2].0[1], Point::new(150.0, 100.0));
    }

    #[test]
    fn virtual_parent_draws_nothing_for_one_child_and_no_drop_for_more() {
        let mut only = at("c", 0.0, 140.0);
        only.parent = Some(ParentRef::Virtual("v_parent_1".to_string()));
        assert!(scene(vec![only]).connectors.is_empty());

        let mut left = at("l", 0.0, 140.0);
        left.parent = Some(ParentRef::Virtual("v_parent_2".to_string()));
        let mut right = at("r", 110.0, 140.0);
        right.parent = Some(ParentRef::Virtual("v_parent_2".to_string()));
        let siblings = scene(vec![left, right]);
        assert_eq!(siblings.connectors_of(ConnectorKind::ParentDrop).count(), 0);
        assert_eq!(siblings.connectors_of(ConnectorKind::SiblingBar).count(), 1);
        assert_eq!(siblings.connectors_of(ConnectorKind::SiblingLeg).count(), 2);
    }

    #[test]
    fn short_zigzag_degrades_to_straight_line() {
        let points = zigzag_points(Point::new(0.0, 0.0), Point::new(25.0, 0.0));
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(25.0, 0.0)]);
    }

    #[test]
    fn zigzag_alternates_around_the_axis() {
        let points = zigzag_points(Point::new(0.0, 0.0), Point::new(54.0, 0.0));
        // 24px of zigzag -> two full waves -> five wave samples.
        assert_eq!(points.len(), 2 + 5 + 1);
        assert_eq!(points[1], Point::new(15.0, 0.0));
        assert_eq!(points[3], Point::new(21.0, 6.0));
        assert_eq!(points[5], Point::new(33.0, -6.0));
        assert_eq!(*points.last().unwrap(), Point::new(54.0, 0.0));
    }

    #[test]
    fn arrow_heads_follow_cardinality() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(100.0, 0.0);
        let one = arrow_heads(start, end, LineArrows::One);
        let two = arrow_heads(start, end, LineArrows::Two);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].tip, end);
        assert!(one[0].left.x < end.x && one[0].right.x < end.x);
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].tip, start);
        assert!(two[0].left.x > start.x);
        assert!(arrow_heads(start, start, LineArrows::Two).is_empty());
    }
}
