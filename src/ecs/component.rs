//! Component kinds, kind sets, and the tagged union over component data.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::collider::Collider;
use crate::components::physics::Physics;
use crate::components::screenconfig::ScreenConfig;
use crate::components::sprite::Sprite;
use crate::components::text::Text;
use crate::components::transform::Transform;

/// Small integer identifier of a component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ComponentKind {
    Transform = 1,
    Sprite = 2,
    Text = 3,
    ScreenConfig = 4,
    Physics = 5,
    Collider = 6,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Transform,
        ComponentKind::Sprite,
        ComponentKind::Text,
        ComponentKind::ScreenConfig,
        ComponentKind::Physics,
        ComponentKind::Collider,
    ];

    pub const fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    /// Name used at the scripting boundary.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "transform",
            ComponentKind::Sprite => "sprite",
            ComponentKind::Text => "text",
            ComponentKind::ScreenConfig => "screen_config",
            ComponentKind::Physics => "physics",
            ComponentKind::Collider => "collider",
        }
    }

    /// Parse a kind name. Accepts `snake_case`, `CamelCase`, and the numeric id.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "transform" => Some(ComponentKind::Transform),
            "sprite" => Some(ComponentKind::Sprite),
            "text" => Some(ComponentKind::Text),
            "screenconfig" => Some(ComponentKind::ScreenConfig),
            "physics" => Some(ComponentKind::Physics),
            "collider" => Some(ComponentKind::Collider),
            other => other.parse().ok().and_then(Self::from_id),
        }
    }

    const fn bit(self) -> u32 {
        1 << self.id()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of component kinds stored as a bit mask.
///
/// Used both as a system's requirement declaration and as an entity's
/// signature (the kinds it currently holds).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentSet(u32);

impl ComponentSet {
    pub const EMPTY: ComponentSet = ComponentSet(0);

    pub const fn new() -> Self {
        Self::EMPTY
    }

    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds.iter().copied().collect()
    }

    /// Builder-style insert.
    pub const fn with(self, kind: ComponentKind) -> Self {
        ComponentSet(self.0 | kind.bit())
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    pub const fn contains(&self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// `true` if every kind in `required` is also in `self`.
    pub const fn contains_all(&self, required: ComponentSet) -> bool {
        self.0 & required.0 == required.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn kinds(&self) -> SmallVec<[ComponentKind; 6]> {
        ComponentKind::ALL
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl FromIterator<ComponentKind> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        let mut set = ComponentSet::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

/// Closed tagged union over every component kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Transform(Transform),
    Sprite(Sprite),
    Text(Text),
    ScreenConfig(ScreenConfig),
    Physics(Physics),
    Collider(Collider),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Sprite(_) => ComponentKind::Sprite,
            Component::Text(_) => ComponentKind::Text,
            Component::ScreenConfig(_) => ComponentKind::ScreenConfig,
            Component::Physics(_) => ComponentKind::Physics,
            Component::Collider(_) => ComponentKind::Collider,
        }
    }

    /// Default-initialised component of the given kind.
    pub fn default_of(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Transform => Transform::default().into(),
            ComponentKind::Sprite => Sprite::default().into(),
            ComponentKind::Text => Text::default().into(),
            ComponentKind::ScreenConfig => ScreenConfig::default().into(),
            ComponentKind::Physics => Physics::default().into(),
            ComponentKind::Collider => Collider::default().into(),
        }
    }
}

/// Typed access to one variant of [`Component`].
pub trait ComponentData: Sized + Into<Component> {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;

    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_data {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Component {
                fn from(value: $ty) -> Self {
                    Component::$ty(value)
                }
            }

            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }

                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

component_data!(Transform, Sprite, Text, ScreenConfig, Physics, Collider);
