use formats::geometry::FeatureCollection;
use layers::layer::{LayerKind, LayerSpec};
use layers::symbology::PathStyle;
use scene::ordering::selected_last;
use scene::selection::SelectionSet;

use crate::path::PathGenerator;
use crate::state::{MapState, Viewport};

/// One `<path>` of the rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPath {
    pub layer: String,
    pub kind: LayerKind,
    /// Feature id; `None` for meshes and anonymous features.
    pub location_id: Option<String>,
    pub d: String,
    pub selected: bool,
    pub class_name: Option<String>,
    pub style: PathStyle,
    /// Choropleth value bound to `location_id`, if any.
    pub value: Option<f64>,
}

/// Paint order of a collection's features: selected ones last, otherwise stable.
pub(crate) fn feature_order(fc: &FeatureCollection, selection: &SelectionSet) -> Vec<usize> {
    selected_last(&fc.features, |f| selection.contains_opt(f.id.as_deref()))
}

/// Renders every visible layer in declared order. Layers that are not cached (their
/// object is missing, or nothing has been projected yet) produce nothing.
pub fn render(state: &MapState) -> Vec<RenderedPath> {
    let Some(paths) = state.path_generator() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for layer in state.layers().iter().filter(|l| l.visible) {
        match layer.kind {
            LayerKind::Feature => render_features(state, layer, &paths, &mut out),
            LayerKind::Mesh => {
                if let Some(mesh) = state.cache().mesh(&layer.name) {
                    out.push(RenderedPath {
                        layer: layer.name.clone(),
                        kind: LayerKind::Mesh,
                        location_id: None,
                        d: paths.path(mesh),
                        selected: false,
                        class_name: layer.class_name.clone(),
                        style: layer.style,
                        value: None,
                    });
                }
            }
        }
    }
    out
}

fn render_features(
    state: &MapState,
    layer: &LayerSpec,
    paths: &PathGenerator,
    out: &mut Vec<RenderedPath>,
) {
    let Some(fc) = state.cache().feature(&layer.name) else {
        return;
    };
    let selection = state.selection();
    for i in feature_order(fc, selection) {
        let feature = &fc.features[i];
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let selected = selection.contains_opt(feature.id.as_deref());
        let (style, class_name) = if selected {
            (
                layer.selected_style.unwrap_or(layer.style),
                layer
                    .selected_class_name
                    .clone()
                    .or_else(|| layer.class_name.clone()),
            )
        } else {
            (layer.style, layer.class_name.clone())
        };
        out.push(RenderedPath {
            layer: layer.name.clone(),
            kind: LayerKind::Feature,
            location_id: feature.id.clone(),
            d: paths.path(geometry),
            selected,
            class_name,
            style,
            value: feature
                .id
                .as_ref()
                .and_then(|id| state.data().get(id).copied()),
        });
    }
}

/// Standalone SVG document for `paths`. Paths with empty data are skipped.
pub fn svg_document(paths: &[RenderedPath], viewport: Viewport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = viewport.width,
        h = viewport.height,
    ));
    out.push('\n');
    for p in paths.iter().filter(|p| !p.d.is_empty()) {
        out.push_str(&format!(r#"<path d="{}""#, p.d));
        if let Some(class) = &p.class_name {
            out.push_str(&format!(r#" class="{}""#, escape_xml(class)));
        }
        if let Some(id) = &p.location_id {
            out.push_str(&format!(r#" data-id="{}""#, escape_xml(id)));
        }
        if let Some(value) = p.value {
            out.push_str(&format!(r#" data-value="{value}""#));
        }
        out.push(' ');
        out.push_str(&p.style.svg_attributes());
        out.push_str("/>\n");
    }
    out.push_str("</svg>\n");
    out
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_xml, render, svg_document};
    use crate::map::InteractiveMap;
    use crate::test_support::{regions_layers, three_regions};
    use crate::{MapConfig, MapEvent};
    use layers::layer::{LayerKind, LayerSpec, MeshFilter};
    use layers::symbology::PathStyle;
    use pretty_assertions::assert_eq;
    use scene::selection::SelectionSet;

    fn mounted(layers: Vec<LayerSpec>) -> InteractiveMap {
        InteractiveMap::mount(MapConfig::default(), three_regions(), layers, 960.0, 500.0)
            .unwrap()
    }

    fn ids(map: &InteractiveMap) -> Vec<Option<String>> {
        render(map.state())
            .into_iter()
            .filter(|p| p.kind == LayerKind::Feature)
            .map(|p| p.location_id)
            .collect()
    }

    #[test]
    fn selected_features_paint_last() {
        let mut map = mounted(regions_layers());
        let some = |s: &str| Some(s.to_string());
        assert_eq!(ids(&map), vec![some("1"), some("2"), some("3")]);

        let selection: SelectionSet = ["1"].into_iter().collect();
        map.apply(MapEvent::SelectionChanged(selection)).unwrap();
        assert_eq!(ids(&map), vec![some("2"), some("3"), some("1")]);
    }

    #[test]
    fn selected_paths_use_selected_style_and_class() {
        let highlight = PathStyle::new(Some([1.0, 0.0, 0.0, 1.0]), None, 1.0);
        let layer = LayerSpec::feature("regions", "regions")
            .with_selected_style(highlight)
            .with_class_names("region", Some("region selected".to_string()));
        let mut map = mounted(vec![layer]);
        let selection: SelectionSet = ["3"].into_iter().collect();
        map.apply(MapEvent::SelectionChanged(selection)).unwrap();

        let paths = render(map.state());
        let last = paths.last().unwrap();
        assert!(last.selected);
        assert_eq!(last.style, highlight);
        assert_eq!(last.class_name.as_deref(), Some("region selected"));
        assert_eq!(paths[0].class_name.as_deref(), Some("region"));
        assert_eq!(paths[0].style, PathStyle::default());
    }

    #[test]
    fn hidden_and_missing_layers_render_nothing() {
        let map = mounted(vec![
            LayerSpec::feature("regions", "regions").with_visible(false),
            LayerSpec::feature("lakes", "lakes"),
            LayerSpec::mesh("disputed", "regions").with_filter(MeshFilter::Disputed),
        ]);
        let paths = render(map.state());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].layer, "disputed");
        assert!(!paths[0].d.is_empty());
    }

    #[test]
    fn data_values_follow_location_ids() {
        let mut map = mounted(regions_layers());
        let values = [("2".to_string(), 41.5)].into_iter().collect();
        map.apply(MapEvent::DataChanged(values)).unwrap();
        let paths = render(map.state());
        let values: Vec<Option<f64>> = paths.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![None, Some(41.5), None, None]);
    }

    #[test]
    fn svg_document_lists_every_path() {
        let map = mounted(regions_layers());
        let svg = svg_document(&render(map.state()), map.state().viewport().unwrap());
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="960""#));
        assert_eq!(svg.matches("<path ").count(), 4);
        assert!(svg.contains(r#"data-id="2""#));
        assert_eq!(escape_xml(r#"a<"b">"#), "a&lt;&quot;b&quot;&gt;");
    }
}
