use crate::symbology::PathStyle;

/// How a layer's topology object is turned into geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LayerKind {
    /// One polygon path per member geometry.
    #[default]
    Feature,
    /// A single border network for the whole object.
    Mesh,
}

impl LayerKind {
    /// Parses a configuration value. Unknown or empty values fall back to `Feature`.
    pub fn parse(value: &str) -> Self {
        match value {
            "mesh" => LayerKind::Mesh,
            _ => LayerKind::Feature,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Feature => "feature",
            LayerKind::Mesh => "mesh",
        }
    }
}

/// Named adjacency predicate applied while building a mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum MeshFilter {
    #[default]
    All,
    /// Borders between two geometries in dispute.
    Disputed,
    /// Outer boundaries plus borders that are not disputed.
    NonDisputed,
    /// Borders touching the current selection.
    SelectedBorders,
}

impl MeshFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(MeshFilter::All),
            "disputed" => Some(MeshFilter::Disputed),
            "non-disputed" => Some(MeshFilter::NonDisputed),
            "selected" => Some(MeshFilter::SelectedBorders),
            _ => None,
        }
    }

    /// Meshes built with this filter go stale when the selection changes.
    pub fn depends_on_selection(self) -> bool {
        matches!(self, MeshFilter::SelectedBorders)
    }
}

/// Cache identity of an extracted layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerKey {
    pub kind: LayerKind,
    pub name: String,
}

impl LayerKey {
    pub fn new(kind: LayerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// One entry of the ordered layer list. List order is paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub name: String,
    /// Key into the topology's `objects`.
    pub object: String,
    pub kind: LayerKind,
    pub visible: bool,
    pub filter: MeshFilter,
    pub style: PathStyle,
    pub selected_style: Option<PathStyle>,
    pub class_name: Option<String>,
    pub selected_class_name: Option<String>,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, object: impl Into<String>, kind: LayerKind) -> Self {
        let style = match kind {
            LayerKind::Feature => PathStyle::default(),
            LayerKind::Mesh => PathStyle::border(),
        };
        Self {
            name: name.into(),
            object: object.into(),
            kind,
            visible: true,
            filter: MeshFilter::All,
            style,
            selected_style: None,
            class_name: None,
            selected_class_name: None,
        }
    }

    pub fn feature(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(name, object, LayerKind::Feature)
    }

    pub fn mesh(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(name, object, LayerKind::Mesh)
    }

    pub fn with_filter(mut self, filter: MeshFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_selected_style(mut self, style: PathStyle) -> Self {
        self.selected_style = Some(style);
        self
    }

    pub fn with_class_names(
        mut self,
        class_name: impl Into<String>,
        selected_class_name: Option<String>,
    ) -> Self {
        self.class_name = Some(class_name.into());
        self.selected_class_name = selected_class_name;
        self
    }

    pub fn key(&self) -> LayerKey {
        LayerKey::new(self.kind, self.name.clone())
    }

    /// The effective mesh filter; feature layers never filter.
    pub fn mesh_filter(&self) -> MeshFilter {
        match self.kind {
            LayerKind::Mesh => self.filter,
            LayerKind::Feature => MeshFilter::All,
        }
    }
}
