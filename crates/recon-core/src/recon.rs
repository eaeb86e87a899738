//! The Recon domain: a rover on a grid photographing signs of life.
//!
//! Agents move between adjacent grid cells and use tools on co-located
//! objects. A water tool may detect water; a life tool may then detect
//! life on an object with water; a camera photographs the object. Tools
//! are damaged by standing in or next to hazard cells and are repaired at
//! the base. Damaged tools detect less reliably and damaged cameras take
//! no pictures.
//!
//! Detection has memory: checking an object for water without detecting
//! it locks detection out for good, and life gets two checks.
//!
//! [`recon_domain`] builds the CPFs and reward as formula trees;
//! [`ReconInstance`] describes a concrete grid and produces the matching
//! [`InstanceDef`].

use recon_types::{GroundVariable, ObjectRef, TypeName, VariableDecl, VariableKind};
use recon_world::FluentStore;
use serde::{Deserialize, Serialize};

use crate::domain::{Cpf, Domain, DomainDef, InstanceDef, LoadError};
use crate::formula::{Formula, params};

/// Type, variable, and action names of the Recon domain.
pub mod names {
    /// Column type.
    pub const X_POS: &str = "x_pos";
    /// Row type.
    pub const Y_POS: &str = "y_pos";
    /// Object type.
    pub const OBJ: &str = "obj";
    /// Agent type.
    pub const AGENT: &str = "agent";
    /// Tool type.
    pub const TOOL: &str = "tool";

    /// `ADJACENT-UP(y, y')`: row `y'` is directly above `y`.
    pub const ADJACENT_UP: &str = "ADJACENT-UP";
    /// `ADJACENT-DOWN(y, y')`: row `y'` is directly below `y`.
    pub const ADJACENT_DOWN: &str = "ADJACENT-DOWN";
    /// `ADJACENT-RIGHT(x, x')`: column `x'` is directly right of `x`.
    pub const ADJACENT_RIGHT: &str = "ADJACENT-RIGHT";
    /// `ADJACENT-LEFT(x, x')`: column `x'` is directly left of `x`.
    pub const ADJACENT_LEFT: &str = "ADJACENT-LEFT";
    /// Object location.
    pub const OBJ_AT: &str = "objAt";
    /// Hazard cells.
    pub const HAZARD: &str = "HAZARD";
    /// Base cells, where tools are repaired.
    pub const BASE: &str = "BASE";
    /// Per-tool damage probability in a hazard cell.
    pub const DAMAGE_PROB: &str = "DAMAGE_PROB";
    /// Detection probability of an undamaged tool.
    pub const DETECT_PROB: &str = "DETECT_PROB";
    /// Detection probability of a damaged tool.
    pub const DETECT_PROB_DAMAGED: &str = "DETECT_PROB_DAMAGED";
    /// Tool role flags.
    pub const CAMERA_TOOL: &str = "CAMERA_TOOL";
    /// Tool role flags.
    pub const LIFE_TOOL: &str = "LIFE_TOOL";
    /// Tool role flags.
    pub const WATER_TOOL: &str = "WATER_TOOL";
    /// Reward for a first good picture.
    pub const GOOD_PIC_WEIGHT: &str = "GOOD_PIC_WEIGHT";
    /// Penalty for a picture without life.
    pub const BAD_PIC_WEIGHT: &str = "BAD_PIC_WEIGHT";

    /// Tool damage.
    pub const DAMAGED: &str = "damaged";
    /// Water check latch.
    pub const WATER_CHECKED: &str = "waterChecked";
    /// Water detection latch.
    pub const WATER_DETECTED: &str = "waterDetected";
    /// First life check latch.
    pub const LIFE_CHECKED: &str = "lifeChecked";
    /// Second life check latch.
    pub const LIFE_CHECKED2: &str = "lifeChecked2";
    /// Life detection latch.
    pub const LIFE_DETECTED: &str = "lifeDetected";
    /// Picture latch.
    pub const PICTURE_TAKEN: &str = "pictureTaken";
    /// Agent position.
    pub const AGENT_AT: &str = "agentAt";

    /// Move one row up.
    pub const UP: &str = "up";
    /// Move one row down.
    pub const DOWN: &str = "down";
    /// Move one column left.
    pub const LEFT: &str = "left";
    /// Move one column right.
    pub const RIGHT: &str = "right";
    /// Use a tool on an object.
    pub const USE_TOOL_ON: &str = "useToolOn";
    /// Repair a tool.
    pub const REPAIR: &str = "repair";
}

use names::{
    ADJACENT_DOWN, ADJACENT_LEFT, ADJACENT_RIGHT, ADJACENT_UP, AGENT, AGENT_AT, BAD_PIC_WEIGHT,
    BASE, CAMERA_TOOL, DAMAGE_PROB, DAMAGED, DETECT_PROB, DETECT_PROB_DAMAGED, DOWN,
    GOOD_PIC_WEIGHT, HAZARD, LEFT, LIFE_CHECKED, LIFE_CHECKED2, LIFE_DETECTED, LIFE_TOOL, OBJ,
    OBJ_AT, PICTURE_TAKEN, REPAIR, RIGHT, TOOL, UP, USE_TOOL_ON, WATER_CHECKED, WATER_DETECTED,
    WATER_TOOL, X_POS, Y_POS,
};

/// Which tools count for a tool-use condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wear {
    Any,
    Damaged,
    Undamaged,
}

/// `exists ?a ?t ?x ?y . agentAt(?a,?x,?y) ^ objAt(?o,?x,?y) ^ useToolOn(?a,?t,?o) ^ ROLE(?t) [^ wear]`
fn tool_used_on(role: &str, wear: Wear) -> Formula {
    let mut body = vec![
        Formula::fluent(AGENT_AT, ["?a", "?x", "?y"]),
        Formula::fluent(OBJ_AT, ["?o", "?x", "?y"]),
        Formula::fluent(USE_TOOL_ON, ["?a", "?t", "?o"]),
        Formula::fluent(role, ["?t"]),
    ];
    match wear {
        Wear::Any => {}
        Wear::Damaged => body.push(Formula::fluent(DAMAGED, ["?t"])),
        Wear::Undamaged => body.push(Formula::negate(Formula::fluent(DAMAGED, ["?t"]))),
    }
    Formula::exists(
        params(&[("?a", AGENT), ("?t", TOOL), ("?x", X_POS), ("?y", Y_POS)]),
        Formula::and(body),
    )
}

/// An undamaged camera used on a co-located object.
fn photo() -> Formula {
    tool_used_on(CAMERA_TOOL, Wear::Undamaged)
}

fn latch(variable: &str, set_when: Formula) -> Cpf {
    Cpf::new(
        variable,
        ["?o"],
        Formula::case(
            vec![
                (Formula::fluent(variable, ["?o"]), Formula::kron(true)),
                (set_when, Formula::kron(true)),
            ],
            Formula::kron(false),
        ),
    )
}

/// Agent arrives in a cell from a neighbour, leaves it for a neighbour, or
/// stays. Simultaneous moves are all applied.
fn agent_at_cpf() -> Cpf {
    let arrive = Formula::exists(
        params(&[("?x2", X_POS), ("?y2", Y_POS)]),
        Formula::and([
            Formula::fluent(AGENT_AT, ["?a", "?x2", "?y2"]),
            Formula::or([
                Formula::and([
                    Formula::fluent(UP, ["?a"]),
                    Formula::fluent(ADJACENT_UP, ["?y2", "?y"]),
                    Formula::same("?x", "?x2"),
                ]),
                Formula::and([
                    Formula::fluent(DOWN, ["?a"]),
                    Formula::fluent(ADJACENT_DOWN, ["?y2", "?y"]),
                    Formula::same("?x", "?x2"),
                ]),
                Formula::and([
                    Formula::fluent(RIGHT, ["?a"]),
                    Formula::fluent(ADJACENT_RIGHT, ["?x2", "?x"]),
                    Formula::same("?y", "?y2"),
                ]),
                Formula::and([
                    Formula::fluent(LEFT, ["?a"]),
                    Formula::fluent(ADJACENT_LEFT, ["?x2", "?x"]),
                    Formula::same("?y", "?y2"),
                ]),
            ]),
        ]),
    );

    let has_neighbour = |action: &str, adjacency: &str, from: &str, var: &str, ty: &str| {
        Formula::and([
            Formula::fluent(action, ["?a"]),
            Formula::exists(params(&[(var, ty)]), Formula::fluent(adjacency, [from, var])),
        ])
    };
    let leave = Formula::and([
        Formula::fluent(AGENT_AT, ["?a", "?x", "?y"]),
        Formula::or([
            has_neighbour(UP, ADJACENT_UP, "?y", "?y2", Y_POS),
            has_neighbour(DOWN, ADJACENT_DOWN, "?y", "?y2", Y_POS),
            has_neighbour(RIGHT, ADJACENT_RIGHT, "?x", "?x2", X_POS),
            has_neighbour(LEFT, ADJACENT_LEFT, "?x", "?x2", X_POS),
        ]),
    ]);

    Cpf::new(
        AGENT_AT,
        ["?a", "?x", "?y"],
        Formula::case(
            vec![(arrive, Formula::kron(true)), (leave, Formula::kron(false))],
            Formula::kron_delta(Formula::fluent(AGENT_AT, ["?a", "?x", "?y"])),
        ),
    )
}

/// Repair at base wins, damage sticks, then a single draw: full probability
/// in a hazard cell, half next to one. Exposures never accumulate.
fn damaged_cpf() -> Cpf {
    let agent_cell = params(&[("?a", AGENT), ("?x", X_POS), ("?y", Y_POS)]);
    let at = || Formula::fluent(AGENT_AT, ["?a", "?x", "?y"]);

    let repaired = Formula::exists(
        agent_cell.clone(),
        Formula::and([
            at(),
            Formula::fluent(BASE, ["?x", "?y"]),
            Formula::fluent(REPAIR, ["?a", "?t"]),
        ]),
    );
    let in_hazard = Formula::exists(
        agent_cell,
        Formula::and([
            at(),
            Formula::fluent(HAZARD, ["?x", "?y"]),
            Formula::negate(Formula::fluent(BASE, ["?x", "?y"])),
        ]),
    );
    let near_hazard = Formula::exists(
        params(&[
            ("?a", AGENT),
            ("?x", X_POS),
            ("?y", Y_POS),
            ("?x2", X_POS),
            ("?y2", Y_POS),
        ]),
        Formula::and([
            at(),
            Formula::fluent(HAZARD, ["?x2", "?y2"]),
            Formula::or([
                Formula::and([
                    Formula::fluent(ADJACENT_LEFT, ["?x", "?x2"]),
                    Formula::same("?y", "?y2"),
                ]),
                Formula::and([
                    Formula::fluent(ADJACENT_RIGHT, ["?x", "?x2"]),
                    Formula::same("?y", "?y2"),
                ]),
                Formula::and([
                    Formula::fluent(ADJACENT_UP, ["?y", "?y2"]),
                    Formula::same("?x", "?x2"),
                ]),
                Formula::and([
                    Formula::fluent(ADJACENT_DOWN, ["?y", "?y2"]),
                    Formula::same("?x", "?x2"),
                ]),
            ]),
        ]),
    );

    let damage_prob = || Formula::fluent(DAMAGE_PROB, ["?t"]);
    Cpf::new(
        DAMAGED,
        ["?t"],
        Formula::case(
            vec![
                (repaired, Formula::kron(false)),
                (Formula::fluent(DAMAGED, ["?t"]), Formula::kron(true)),
                (in_hazard, Formula::bernoulli(damage_prob())),
                (
                    near_hazard,
                    Formula::bernoulli(Formula::quotient(damage_prob(), Formula::real(2.0))),
                ),
            ],
            Formula::kron(false),
        ),
    )
}

/// Water is detected at most once per object: a check that misses locks
/// detection out.
fn water_detected_cpf() -> Cpf {
    Cpf::new(
        WATER_DETECTED,
        ["?o"],
        Formula::case(
            vec![
                (Formula::fluent(WATER_DETECTED, ["?o"]), Formula::kron(true)),
                (Formula::fluent(WATER_CHECKED, ["?o"]), Formula::kron(false)),
                (
                    tool_used_on(WATER_TOOL, Wear::Undamaged),
                    Formula::bernoulli(Formula::constant_ref(DETECT_PROB)),
                ),
                (
                    tool_used_on(WATER_TOOL, Wear::Damaged),
                    Formula::bernoulli(Formula::constant_ref(DETECT_PROB_DAMAGED)),
                ),
            ],
            Formula::kron(false),
        ),
    )
}

/// Life needs water and gets two checks.
fn life_detected_cpf() -> Cpf {
    Cpf::new(
        LIFE_DETECTED,
        ["?o"],
        Formula::case(
            vec![
                (Formula::fluent(LIFE_DETECTED, ["?o"]), Formula::kron(true)),
                (Formula::fluent(LIFE_CHECKED2, ["?o"]), Formula::kron(false)),
                (
                    Formula::negate(Formula::fluent(WATER_DETECTED, ["?o"])),
                    Formula::kron(false),
                ),
                (
                    tool_used_on(LIFE_TOOL, Wear::Undamaged),
                    Formula::bernoulli(Formula::constant_ref(DETECT_PROB)),
                ),
                (
                    tool_used_on(LIFE_TOOL, Wear::Damaged),
                    Formula::bernoulli(Formula::constant_ref(DETECT_PROB_DAMAGED)),
                ),
            ],
            Formula::kron(false),
        ),
    )
}

/// `sum_o GOOD * [~pictureTaken ^ lifeDetected ^ photo] - sum_o BAD * [~lifeDetected ^ photo]`.
///
/// The penalty has no `~pictureTaken` guard: every photo of an object
/// without detected life is penalized, not just the first.
fn reward() -> Formula {
    let each_obj = || params(&[("?o", OBJ)]);
    let good = Formula::sum(
        each_obj(),
        Formula::product(
            Formula::constant_ref(GOOD_PIC_WEIGHT),
            Formula::and([
                Formula::negate(Formula::fluent(PICTURE_TAKEN, ["?o"])),
                Formula::fluent(LIFE_DETECTED, ["?o"]),
                photo(),
            ]),
        ),
    );
    let bad = Formula::sum(
        each_obj(),
        Formula::product(
            Formula::constant_ref(BAD_PIC_WEIGHT),
            Formula::and([
                Formula::negate(Formula::fluent(LIFE_DETECTED, ["?o"])),
                photo(),
            ]),
        ),
    );
    Formula::difference(good, bad)
}

/// Build the Recon domain definition.
pub fn recon_domain() -> DomainDef {
    let t = TypeName::from;
    let non = VariableKind::NonFluent;
    let state = VariableKind::StateFluent;
    let action = VariableKind::ActionFluent;

    let variables = vec![
        VariableDecl::boolean(ADJACENT_UP, non, [t(Y_POS), t(Y_POS)]),
        VariableDecl::boolean(ADJACENT_DOWN, non, [t(Y_POS), t(Y_POS)]),
        VariableDecl::boolean(ADJACENT_RIGHT, non, [t(X_POS), t(X_POS)]),
        VariableDecl::boolean(ADJACENT_LEFT, non, [t(X_POS), t(X_POS)]),
        VariableDecl::boolean(OBJ_AT, non, [t(OBJ), t(X_POS), t(Y_POS)]),
        VariableDecl::boolean(HAZARD, non, [t(X_POS), t(Y_POS)]),
        VariableDecl::boolean(BASE, non, [t(X_POS), t(Y_POS)]),
        VariableDecl::real(DAMAGE_PROB, non, [t(TOOL)], 0.0),
        VariableDecl::real(DETECT_PROB, non, [], 0.8),
        VariableDecl::real(DETECT_PROB_DAMAGED, non, [], 0.4),
        VariableDecl::boolean(CAMERA_TOOL, non, [t(TOOL)]),
        VariableDecl::boolean(LIFE_TOOL, non, [t(TOOL)]),
        VariableDecl::boolean(WATER_TOOL, non, [t(TOOL)]),
        VariableDecl::real(GOOD_PIC_WEIGHT, non, [], 1.0),
        VariableDecl::real(BAD_PIC_WEIGHT, non, [], 2.0),
        VariableDecl::boolean(DAMAGED, state, [t(TOOL)]),
        VariableDecl::boolean(WATER_CHECKED, state, [t(OBJ)]),
        VariableDecl::boolean(WATER_DETECTED, state, [t(OBJ)]),
        VariableDecl::boolean(LIFE_CHECKED, state, [t(OBJ)]),
        VariableDecl::boolean(LIFE_CHECKED2, state, [t(OBJ)]),
        VariableDecl::boolean(LIFE_DETECTED, state, [t(OBJ)]),
        VariableDecl::boolean(PICTURE_TAKEN, state, [t(OBJ)]),
        VariableDecl::boolean(AGENT_AT, state, [t(AGENT), t(X_POS), t(Y_POS)]),
        VariableDecl::boolean(UP, action, [t(AGENT)]),
        VariableDecl::boolean(DOWN, action, [t(AGENT)]),
        VariableDecl::boolean(LEFT, action, [t(AGENT)]),
        VariableDecl::boolean(RIGHT, action, [t(AGENT)]),
        VariableDecl::boolean(USE_TOOL_ON, action, [t(AGENT), t(TOOL), t(OBJ)]),
        VariableDecl::boolean(REPAIR, action, [t(AGENT), t(TOOL)]),
    ];

    let cpfs = vec![
        damaged_cpf(),
        latch(WATER_CHECKED, tool_used_on(WATER_TOOL, Wear::Any)),
        water_detected_cpf(),
        latch(LIFE_CHECKED, tool_used_on(LIFE_TOOL, Wear::Any)),
        latch(
            LIFE_CHECKED2,
            Formula::and([
                Formula::fluent(LIFE_CHECKED, ["?o"]),
                tool_used_on(LIFE_TOOL, Wear::Any),
            ]),
        ),
        life_detected_cpf(),
        latch(PICTURE_TAKEN, photo()),
        agent_at_cpf(),
    ];

    DomainDef {
        name: "recon_mdp".to_owned(),
        types: [X_POS, Y_POS, OBJ, AGENT, TOOL].into_iter().map(t).collect(),
        variables,
        cpfs,
        reward: reward(),
    }
}

/// Errors building a Recon instance.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// The grid has no cells.
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },

    /// A configured cell lies outside the grid.
    #[error("{what} at ({x}, {y}) is outside the {width}x{height} grid")]
    CellOutOfBounds {
        /// What was placed there.
        what: String,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// The built instance failed domain validation.
    #[error("load error: {source}")]
    Load {
        /// The underlying load error.
        #[from]
        source: LoadError,
    },
}

/// A grid cell; `y` grows upwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
}

impl Cell {
    /// Create a cell.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The `x_pos` object of this cell's column.
    pub fn x_ref(self) -> ObjectRef {
        ObjectRef::new(X_POS, x_name(self.x))
    }

    /// The `y_pos` object of this cell's row.
    pub fn y_ref(self) -> ObjectRef {
        ObjectRef::new(Y_POS, y_name(self.y))
    }
}

/// What a tool does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolRole {
    /// Takes pictures.
    Camera,
    /// Detects life.
    Life,
    /// Detects water.
    Water,
}

impl ToolRole {
    /// The role's non-fluent flag.
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Camera => CAMERA_TOOL,
            Self::Life => LIFE_TOOL,
            Self::Water => WATER_TOOL,
        }
    }
}

/// A tool carried by the agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Object name.
    pub name: String,
    /// What the tool does.
    pub role: ToolRole,
    /// Probability of damage per step in a hazard cell.
    pub damage_prob: f64,
}

/// An agent and its starting cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Object name.
    pub name: String,
    /// Starting cell.
    pub start: Cell,
}

/// An object to investigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Object name.
    pub name: String,
    /// Location.
    pub at: Cell,
}

/// A concrete Recon problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconInstance {
    /// Instance name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Base cell.
    pub base: Cell,
    /// Hazard cells.
    #[serde(default)]
    pub hazards: Vec<Cell>,
    /// Agents.
    pub agents: Vec<AgentSpec>,
    /// Tools.
    pub tools: Vec<ToolSpec>,
    /// Objects.
    pub objects: Vec<ObjectSpec>,
    /// Reward for a first picture of an object with life.
    #[serde(default = "default_good_pic_weight")]
    pub good_pic_weight: f64,
    /// Penalty for a picture of an object without detected life.
    #[serde(default = "default_bad_pic_weight")]
    pub bad_pic_weight: f64,
    /// Detection probability of an undamaged tool.
    #[serde(default = "default_detect_prob")]
    pub detect_prob: f64,
    /// Detection probability of a damaged tool.
    #[serde(default = "default_detect_prob_damaged")]
    pub detect_prob_damaged: f64,
}

fn default_name() -> String {
    "recon_inst".to_owned()
}

const fn default_good_pic_weight() -> f64 {
    1.0
}

const fn default_bad_pic_weight() -> f64 {
    2.0
}

const fn default_detect_prob() -> f64 {
    0.8
}

const fn default_detect_prob_damaged() -> f64 {
    0.4
}

impl Default for ReconInstance {
    /// A 3x3 grid with the base in a corner, one hazard, one rover, the
    /// three tools, and two objects.
    fn default() -> Self {
        let tool = |name: &str, role, damage_prob| ToolSpec {
            name: name.to_owned(),
            role,
            damage_prob,
        };
        Self {
            name: default_name(),
            width: 3,
            height: 3,
            base: Cell::new(0, 0),
            hazards: vec![Cell::new(1, 1)],
            agents: vec![AgentSpec {
                name: "a1".to_owned(),
                start: Cell::new(0, 0),
            }],
            tools: vec![
                tool("camera", ToolRole::Camera, 0.3),
                tool("l1", ToolRole::Life, 0.4),
                tool("w1", ToolRole::Water, 0.2),
            ],
            objects: vec![
                ObjectSpec {
                    name: "o1".to_owned(),
                    at: Cell::new(2, 1),
                },
                ObjectSpec {
                    name: "o2".to_owned(),
                    at: Cell::new(1, 2),
                },
            ],
            good_pic_weight: default_good_pic_weight(),
            bad_pic_weight: default_bad_pic_weight(),
            detect_prob: default_detect_prob(),
            detect_prob_damaged: default_detect_prob_damaged(),
        }
    }
}

impl ReconInstance {
    /// Build the instance: objects, grid adjacency, hazards, base, tool
    /// roles, weights, and starting positions.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::EmptyGrid`] or
    /// [`InstanceError::CellOutOfBounds`] for an ill-formed grid.
    pub fn to_instance_def(&self) -> Result<InstanceDef, InstanceError> {
        if self.width == 0 || self.height == 0 {
            return Err(InstanceError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        self.check_cell("base", self.base)?;
        for hazard in &self.hazards {
            self.check_cell("hazard", *hazard)?;
        }
        for agent in &self.agents {
            self.check_cell(&agent.name, agent.start)?;
        }
        for object in &self.objects {
            self.check_cell(&object.name, object.at)?;
        }

        let xs: Vec<String> = (0..self.width).map(x_name).collect();
        let ys: Vec<String> = (0..self.height).map(y_name).collect();
        let mut def = InstanceDef::new(self.name.clone())
            .with_objects(X_POS, xs.iter().map(String::as_str))
            .with_objects(Y_POS, ys.iter().map(String::as_str))
            .with_objects(OBJ, self.objects.iter().map(|o| o.name.as_str()))
            .with_objects(AGENT, self.agents.iter().map(|a| a.name.as_str()))
            .with_objects(TOOL, self.tools.iter().map(|t| t.name.as_str()));

        for pair in ys.windows(2) {
            if let [below, above] = pair {
                let lo = ObjectRef::new(Y_POS, below.as_str());
                let hi = ObjectRef::new(Y_POS, above.as_str());
                def = def
                    .with_non_fluent(adjacency(ADJACENT_UP, &lo, &hi), true)
                    .with_non_fluent(adjacency(ADJACENT_DOWN, &hi, &lo), true);
            }
        }
        for pair in xs.windows(2) {
            if let [left, right] = pair {
                let l = ObjectRef::new(X_POS, left.as_str());
                let r = ObjectRef::new(X_POS, right.as_str());
                def = def
                    .with_non_fluent(adjacency(ADJACENT_RIGHT, &l, &r), true)
                    .with_non_fluent(adjacency(ADJACENT_LEFT, &r, &l), true);
            }
        }

        def = def.with_non_fluent(cell_fluent(BASE, self.base), true);
        for hazard in &self.hazards {
            def = def.with_non_fluent(cell_fluent(HAZARD, *hazard), true);
        }
        for object in &self.objects {
            let args = vec![
                ObjectRef::new(OBJ, object.name.as_str()),
                object.at.x_ref(),
                object.at.y_ref(),
            ];
            def = def.with_non_fluent(GroundVariable::new(OBJ_AT, args), true);
        }
        for tool in &self.tools {
            let tool_ref = vec![ObjectRef::new(TOOL, tool.name.as_str())];
            def = def
                .with_non_fluent(GroundVariable::new(tool.role.flag(), tool_ref.clone()), true)
                .with_non_fluent(GroundVariable::new(DAMAGE_PROB, tool_ref), tool.damage_prob);
        }
        def = def
            .with_non_fluent(GroundVariable::nullary(GOOD_PIC_WEIGHT), self.good_pic_weight)
            .with_non_fluent(GroundVariable::nullary(BAD_PIC_WEIGHT), self.bad_pic_weight)
            .with_non_fluent(GroundVariable::nullary(DETECT_PROB), self.detect_prob)
            .with_non_fluent(
                GroundVariable::nullary(DETECT_PROB_DAMAGED),
                self.detect_prob_damaged,
            );

        for agent in &self.agents {
            def = def.with_initial(agent_at(&agent.name, agent.start), true);
        }
        Ok(def)
    }

    /// Build and load the Recon domain for this instance.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError`] for an ill-formed grid or a failed load.
    pub fn load(&self) -> Result<(Domain, FluentStore), InstanceError> {
        let instance = self.to_instance_def()?;
        Ok(Domain::load(recon_domain(), instance)?)
    }

    fn check_cell(&self, what: &str, cell: Cell) -> Result<(), InstanceError> {
        if cell.x < self.width && cell.y < self.height {
            Ok(())
        } else {
            Err(InstanceError::CellOutOfBounds {
                what: what.to_owned(),
                x: cell.x,
                y: cell.y,
                width: self.width,
                height: self.height,
            })
        }
    }
}

fn x_name(i: usize) -> String {
    format!("x{i}")
}

fn y_name(i: usize) -> String {
    format!("y{i}")
}

fn adjacency(name: &str, from: &ObjectRef, to: &ObjectRef) -> GroundVariable {
    GroundVariable::new(name, vec![from.clone(), to.clone()])
}

fn cell_fluent(name: &str, cell: Cell) -> GroundVariable {
    GroundVariable::new(name, vec![cell.x_ref(), cell.y_ref()])
}

/// Movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One row up.
    Up,
    /// One row down.
    Down,
    /// One column left.
    Left,
    /// One column right.
    Right,
}

impl Direction {
    /// The action-fluent name.
    pub const fn action(self) -> &'static str {
        match self {
            Self::Up => UP,
            Self::Down => DOWN,
            Self::Left => LEFT,
            Self::Right => RIGHT,
        }
    }
}

/// `agentAt(agent, x, y)`.
pub fn agent_at(agent: &str, cell: Cell) -> GroundVariable {
    GroundVariable::new(
        AGENT_AT,
        vec![ObjectRef::new(AGENT, agent), cell.x_ref(), cell.y_ref()],
    )
}

/// A state-fluent over one object, e.g. `object_fluent("pictureTaken", "o1")`.
pub fn object_fluent(name: &str, object: &str) -> GroundVariable {
    GroundVariable::new(name, vec![ObjectRef::new(OBJ, object)])
}

/// `damaged(tool)`.
pub fn damaged(tool: &str) -> GroundVariable {
    GroundVariable::new(DAMAGED, vec![ObjectRef::new(TOOL, tool)])
}

/// A move action.
pub fn move_agent(agent: &str, direction: Direction) -> GroundVariable {
    GroundVariable::new(direction.action(), vec![ObjectRef::new(AGENT, agent)])
}

/// `useToolOn(agent, tool, object)`.
pub fn use_tool_on(agent: &str, tool: &str, object: &str) -> GroundVariable {
    GroundVariable::new(
        USE_TOOL_ON,
        vec![
            ObjectRef::new(AGENT, agent),
            ObjectRef::new(TOOL, tool),
            ObjectRef::new(OBJ, object),
        ],
    )
}

/// `repair(agent, tool)`.
pub fn repair(agent: &str, tool: &str) -> GroundVariable {
    GroundVariable::new(
        REPAIR,
        vec![ObjectRef::new(AGENT, agent), ObjectRef::new(TOOL, tool)],
    )
}
