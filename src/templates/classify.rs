//! Atom / Molecule / Organism / Template classification of template markup.

use super::TemplateType;
use crate::markup::Fragment;
use scraper::ElementRef;

/// Parses a template string as a fragment and classifies its top element
///
/// Markup that yields no element is `Unknown`. When the fragment has several
/// top-level elements only the first is classified.
pub fn classify_markup(markup: &str) -> TemplateType {
    let fragment = Fragment::parse(markup);
    match fragment.first_element() {
        Some(element) => classify_element(element, true),
        None => {
            ::log::debug!("No element in template markup {:?}", markup);
            TemplateType::Unknown
        }
    }
}

fn classify_element(element: ElementRef<'_>, is_top: bool) -> TemplateType {
    let children: Vec<TemplateType> = element
        .children()
        .filter_map(ElementRef::wrap)
        .map(|child| classify_element(child, false))
        .collect();
    compose(&children, is_top)
}

/// Applies the composition rules to a node's classified children
pub fn compose(children: &[TemplateType], is_top: bool) -> TemplateType {
    if children.is_empty() {
        return TemplateType::Atom;
    }

    let count = |kind: TemplateType| children.iter().filter(|&&c| c == kind).count();
    let atoms = count(TemplateType::Atom);
    let molecules = count(TemplateType::Molecule);
    let organisms = count(TemplateType::Organism);
    let templates = count(TemplateType::Template);

    if children.len() == 1 && atoms == 1 {
        return TemplateType::Atom;
    }
    if atoms > 1 && molecules == 0 && organisms == 0 && templates == 0 {
        return TemplateType::Molecule;
    }
    if templates == 0 && ((molecules == 1 && atoms >= 1) || molecules > 1 || organisms >= 1) {
        return TemplateType::Organism;
    }
    if is_top {
        return TemplateType::Template;
    }
    TemplateType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use TemplateType::*;

    #[test]
    fn test_compose_rules() {
        assert_eq!(compose(&[], false), Atom);
        assert_eq!(compose(&[Atom], false), Atom);
        assert_eq!(compose(&[Atom, Atom, Unknown], false), Molecule);
        assert_eq!(compose(&[Molecule, Atom], false), Organism);
        assert_eq!(compose(&[Molecule, Molecule], false), Organism);
        assert_eq!(compose(&[Organism], false), Organism);
        assert_eq!(compose(&[Organism, Template], false), Unknown);
        assert_eq!(compose(&[Organism, Template], true), Template);
        assert_eq!(compose(&[Molecule], true), Template);
        assert_eq!(compose(&[Molecule], false), Unknown);
    }

    #[test]
    fn test_table_row_is_classified_by_its_cells() {
        let row = "<tr><td><span>Lamp</span></td><td>$10</td></tr>";
        assert_eq!(classify_markup(row), Molecule);
        assert_eq!(classify_markup("<td>$10</td>"), Atom);
    }
}
