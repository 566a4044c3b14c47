//! Page slicing over a flat document sequence.
//!
//! Pages are not stored separately. A page is its sentinel element plus the
//! run of elements that follow it up to the next sentinel (of any id, deleted
//! or not) or the end of the sequence. Every function here is pure and
//! returns a new sequence instead of mutating its input.

use std::ops::Range;

use crate::element::{Element, ElementId};

/// Position of the first page sentinel with the given id.
fn sentinel_position(page_id: &str, elements: &[Element]) -> Option<usize> {
    elements
        .iter()
        .position(|el| el.is_page() && el.id == page_id)
}

/// Exclusive end of the run that starts at the sentinel at `sentinel`.
fn run_end(sentinel: usize, elements: &[Element]) -> usize {
    elements[sentinel + 1..]
        .iter()
        .position(Element::is_page)
        .map_or(elements.len(), |offset| sentinel + 1 + offset)
}

/// Index range of a page's run within `elements`.
///
/// When `page_id` is `None` or names no sentinel, the range covers the whole
/// sequence. Callers that need strict page isolation must check that the
/// page exists first.
pub fn page_run_range(
    page_id: Option<&str>,
    elements: &[Element],
    include_sentinel: bool,
) -> Range<usize> {
    match page_id.and_then(|id| sentinel_position(id, elements)) {
        Some(sentinel) => {
            let start = if include_sentinel { sentinel } else { sentinel + 1 };
            start..run_end(sentinel, elements)
        }
        None => 0..elements.len(),
    }
}

/// Elements on the given page, in order.
///
/// Falls back to the whole sequence when the page does not exist; see
/// [`page_run_range`].
pub fn get_elements_on_page<'a>(
    page_id: Option<&str>,
    elements: &'a [Element],
    include_sentinel: bool,
) -> &'a [Element] {
    &elements[page_run_range(page_id, elements, include_sentinel)]
}

/// The page sentinel with the given id.
pub fn find_page_element<'a>(page_id: Option<&str>, elements: &'a [Element]) -> Option<&'a Element> {
    let page_id = page_id?;
    elements.iter().find(|el| el.is_page() && el.id == page_id)
}

/// Replace the run of `page_id` with `new_elements`.
///
/// The sentinel itself, everything before it and everything from the next
/// sentinel onward are kept as they are. An unknown page leaves the sequence
/// unchanged.
pub fn replace_elements_on_page(
    page_id: &str,
    new_elements: &[Element],
    all_elements: &[Element],
) -> Vec<Element> {
    let Some(sentinel) = sentinel_position(page_id, all_elements) else {
        return all_elements.to_vec();
    };
    let end = run_end(sentinel, all_elements);
    let mut result =
        Vec::with_capacity(all_elements.len() - (end - sentinel - 1) + new_elements.len());
    result.extend_from_slice(&all_elements[..=sentinel]);
    result.extend_from_slice(new_elements);
    result.extend_from_slice(&all_elements[end..]);
    result
}

/// Insert `new_page` right after the full run of `after_page_id`.
///
/// The page lands in front of the next live sentinel; if there is none it is
/// appended at the end.
pub fn add_page(new_page: Element, after_page_id: &str, all_elements: &[Element]) -> Vec<Element> {
    let splice_at = all_elements
        .iter()
        .position(|el| el.id == after_page_id)
        .and_then(|after| {
            all_elements[after + 1..]
                .iter()
                .position(|el| el.is_page() && !el.is_deleted && el.id != after_page_id)
                .map(|offset| after + 1 + offset)
        });

    let mut result = all_elements.to_vec();
    match splice_at {
        Some(idx) => result.insert(idx, new_page),
        None => result.push(new_page),
    }
    result
}

/// Soft-delete every element of a page.
///
/// With `only_clear_elements_on_page` the sentinel survives and the page is
/// left empty; this keeps at least one page in the document. Nothing is
/// removed, so the length of the sequence never changes.
pub fn delete_page(
    page_id: &str,
    all_elements: &[Element],
    only_clear_elements_on_page: bool,
) -> Vec<Element> {
    let mut on_page = false;
    all_elements
        .iter()
        .map(|el| {
            if on_page && el.is_page() {
                on_page = false;
            } else if el.id == page_id {
                on_page = true;
                if only_clear_elements_on_page {
                    return el.clone();
                }
            }
            if on_page {
                el.soft_deleted()
            } else {
                el.clone()
            }
        })
        .collect()
}

/// Choose the page to show after `deleted_page_id` goes away.
///
/// Prefers the closest live page before it, then the first live page at or
/// after it.
pub fn find_substitute_for_deleted_page(
    deleted_page_id: &str,
    elements: &[Element],
) -> Option<ElementId> {
    let mut previous: Option<&Element> = None;
    for (i, el) in elements.iter().enumerate() {
        if el.id == deleted_page_id {
            if let Some(page) = previous {
                return Some(page.id.clone());
            }
            return elements[i..]
                .iter()
                .find(|el| el.is_page() && !el.is_deleted)
                .map(|page| page.id.clone());
        }
        if el.is_page() && !el.is_deleted {
            previous = Some(el);
        }
    }
    previous.map(|page| page.id.clone())
}

/// True unless `page_id` is the first live page.
pub fn has_page_before(page_id: &str, elements: &[Element]) -> bool {
    elements
        .iter()
        .find(|el| el.is_page() && !el.is_deleted)
        .map(|el| el.id.as_str())
        != Some(page_id)
}

/// True unless `page_id` is the last live page.
pub fn has_page_after(page_id: &str, elements: &[Element]) -> bool {
    elements
        .iter()
        .rev()
        .find(|el| el.is_page() && !el.is_deleted)
        .map(|el| el.id.as_str())
        != Some(page_id)
}

/// Exactly one live page and no live content.
pub fn has_single_empty_page(elements: &[Element]) -> bool {
    let (pages, content) = elements
        .iter()
        .filter(|el| !el.is_deleted)
        .fold((0usize, 0usize), |(pages, content), el| {
            if el.is_page() {
                (pages + 1, content)
            } else {
                (pages, content + 1)
            }
        });
    pages == 1 && content == 0
}

/// One page run inside a document sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub id: ElementId,
    /// Position of the sentinel.
    pub sentinel: usize,
    /// Exclusive end of the run.
    pub end: usize,
    pub is_deleted: bool,
}

impl PageRange {
    /// Positions of the page's content, sentinel excluded.
    pub fn content(&self) -> Range<usize> {
        self.sentinel + 1..self.end
    }

    /// Positions of the whole run, sentinel included.
    pub fn full(&self) -> Range<usize> {
        self.sentinel..self.end
    }

    /// Number of content elements.
    pub fn len(&self) -> usize {
        self.end - self.sentinel - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Page boundaries of a document sequence.
///
/// Rebuilt from scratch whenever the sequence changes, so callers work with
/// ranges instead of rescanning for sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndex {
    ranges: Vec<PageRange>,
    /// Elements before the first sentinel. They belong to no page.
    leading: usize,
}

impl PageIndex {
    /// Scan `elements` and record every page run.
    pub fn build(elements: &[Element]) -> Self {
        let mut ranges: Vec<PageRange> = Vec::new();
        for (i, el) in elements.iter().enumerate() {
            if !el.is_page() {
                continue;
            }
            if let Some(last) = ranges.last_mut() {
                last.end = i;
            }
            ranges.push(PageRange {
                id: el.id.clone(),
                sentinel: i,
                end: elements.len(),
                is_deleted: el.is_deleted,
            });
        }
        let leading = ranges.first().map_or(elements.len(), |r| r.sentinel);
        Self { ranges, leading }
    }

    /// All runs, deleted pages included, in sequence order.
    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    /// The run of the first sentinel with this id.
    pub fn range(&self, page_id: &str) -> Option<&PageRange> {
        self.ranges.iter().find(|r| r.id == page_id)
    }

    /// Ids of live pages in order, with consecutive repeats collapsed.
    pub fn live_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = Vec::new();
        for range in self.ranges.iter().filter(|r| !r.is_deleted) {
            if ids.last() != Some(&range.id) {
                ids.push(range.id.clone());
            }
        }
        ids
    }

    /// The page that owns the element at `position`.
    pub fn owner_of(&self, position: usize) -> Option<&PageRange> {
        let idx = self
            .ranges
            .partition_point(|r| r.sentinel <= position)
            .checked_sub(1)?;
        self.ranges.get(idx).filter(|r| position < r.end)
    }

    /// Number of elements that precede the first sentinel.
    pub fn leading_len(&self) -> usize {
        self.leading
    }

    /// Page ids that appear on more than one sentinel.
    pub fn duplicate_page_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for range in &self.ranges {
            if !seen.insert(range.id.as_str()) && !duplicates.contains(&range.id.as_str()) {
                duplicates.push(range.id.as_str());
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use kurbo::Point;

    fn page(id: &str) -> Element {
        Element::page().with_id(id)
    }

    fn shape(id: &str) -> Element {
        Element::new(ElementKind::Rectangle, Point::ZERO, 10.0, 10.0).with_id(id)
    }

    fn ids(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|el| el.id.as_str()).collect()
    }

    /// [Page A, Shape1, Shape2, Page B, Shape3]
    fn two_pages() -> Vec<Element> {
        vec![page("A"), shape("s1"), shape("s2"), page("B"), shape("s3")]
    }

    #[test]
    fn test_elements_on_page() {
        let elements = two_pages();
        assert_eq!(ids(get_elements_on_page(Some("B"), &elements, false)), vec!["s3"]);
        assert_eq!(ids(get_elements_on_page(Some("A"), &elements, false)), vec!["s1", "s2"]);
        assert_eq!(
            ids(get_elements_on_page(Some("A"), &elements, true)),
            vec!["A", "s1", "s2"]
        );
    }

    #[test]
    fn test_elements_on_empty_page() {
        let elements = vec![page("A"), page("B"), shape("s1")];
        assert!(get_elements_on_page(Some("A"), &elements, false).is_empty());
        assert_eq!(ids(get_elements_on_page(Some("A"), &elements, true)), vec!["A"]);
    }

    #[test]
    fn test_deleted_sentinel_still_delimits() {
        let elements = vec![page("A"), shape("s1"), page("B").soft_deleted(), shape("s2")];
        assert_eq!(ids(get_elements_on_page(Some("A"), &elements, false)), vec!["s1"]);
    }

    #[test]
    fn test_missing_page_falls_back_to_whole_sequence() {
        // An unknown or absent page id yields the whole sequence, not an empty one.
        let elements = two_pages();
        assert_eq!(get_elements_on_page(Some("nope"), &elements, false).len(), 5);
        assert_eq!(get_elements_on_page(None, &elements, false).len(), 5);
        assert_eq!(get_elements_on_page(None, &elements, true).len(), 5);
    }

    #[test]
    fn test_round_trip_contiguity() {
        let mut elements = Vec::new();
        for p in 0..4 {
            elements.push(page(&format!("p{p}")));
            for k in 0..=p {
                elements.push(shape(&format!("p{p}-{k}")));
            }
        }

        for p in 0..4 {
            let id = format!("p{p}");
            let on_page = get_elements_on_page(Some(&id), &elements, false);
            assert_eq!(on_page.len(), p + 1);
            assert!(on_page.iter().all(|el| el.id.starts_with(&format!("{id}-"))));
        }

        let replacement = vec![shape("new1"), shape("new2"), shape("new3")];
        let replaced = replace_elements_on_page("p1", &replacement, &elements);
        assert_eq!(get_elements_on_page(Some("p1"), &replaced, false), replacement.as_slice());
        for p in [0, 2, 3] {
            let id = format!("p{p}");
            assert_eq!(
                get_elements_on_page(Some(&id), &replaced, true),
                get_elements_on_page(Some(&id), &elements, true)
            );
        }
        assert_eq!(replaced.len(), elements.len() - 2 + 3);
    }

    #[test]
    fn test_replace_last_page() {
        let replaced = replace_elements_on_page("B", &[shape("x")], &two_pages());
        assert_eq!(ids(&replaced), vec!["A", "s1", "s2", "B", "x"]);
    }

    #[test]
    fn test_replace_unknown_page_is_noop() {
        let elements = two_pages();
        assert_eq!(replace_elements_on_page("Z", &[shape("x")], &elements), elements);
    }

    #[test]
    fn test_add_page_after_middle_page() {
        let added = add_page(page("C"), "A", &two_pages());
        assert_eq!(ids(&added), vec!["A", "s1", "s2", "C", "B", "s3"]);
    }

    #[test]
    fn test_add_page_after_last_page_appends() {
        let added = add_page(page("C"), "B", &two_pages());
        assert_eq!(ids(&added), vec!["A", "s1", "s2", "B", "s3", "C"]);
    }

    #[test]
    fn test_add_page_skips_deleted_sentinels() {
        let elements = vec![page("A"), shape("s1"), page("B").soft_deleted(), page("D")];
        let added = add_page(page("C"), "A", &elements);
        assert_eq!(ids(&added), vec!["A", "s1", "B", "C", "D"]);
    }

    #[test]
    fn test_delete_page_soft_deletes_run() {
        let elements = two_pages();
        let deleted = delete_page("A", &elements, false);
        assert_eq!(deleted.len(), elements.len());
        assert!(deleted[..3].iter().all(|el| el.is_deleted));
        assert_eq!(&deleted[3..], &elements[3..]);
    }

    #[test]
    fn test_delete_page_only_clears_content() {
        let elements = vec![page("A"), shape("s1"), shape("s2")];
        let cleared = delete_page("A", &elements, true);
        assert!(!cleared[0].is_deleted);
        assert!(cleared[1].is_deleted && cleared[2].is_deleted);
        assert!(has_single_empty_page(&cleared));
        assert!(!has_single_empty_page(&elements));
    }

    #[test]
    fn test_find_substitute_prefers_previous_page() {
        let elements = delete_page("B", &[page("A"), page("B"), page("C")], false);
        assert_eq!(find_substitute_for_deleted_page("B", &elements), Some("A".to_string()));
    }

    #[test]
    fn test_find_substitute_falls_forward() {
        let elements = delete_page("A", &[page("A"), shape("s1"), page("B")], false);
        assert_eq!(find_substitute_for_deleted_page("A", &elements), Some("B".to_string()));
    }

    #[test]
    fn test_find_substitute_none_without_live_pages() {
        let elements = delete_page("A", &[page("A"), shape("s1")], false);
        assert_eq!(find_substitute_for_deleted_page("A", &elements), None);
    }

    #[test]
    fn test_page_adjacency() {
        let elements = vec![page("A").soft_deleted(), page("B"), page("C"), page("D").soft_deleted()];
        assert!(!has_page_before("B", &elements));
        assert!(has_page_after("B", &elements));
        assert!(has_page_before("C", &elements));
        assert!(!has_page_after("C", &elements));
    }

    #[test]
    fn test_find_page_element() {
        let elements = two_pages();
        assert_eq!(find_page_element(Some("B"), &elements).map(|p| p.id.as_str()), Some("B"));
        assert!(find_page_element(Some("s1"), &elements).is_none());
        assert!(find_page_element(None, &elements).is_none());
    }

    #[test]
    fn test_page_index_ranges() {
        let mut elements = vec![shape("orphan")];
        elements.extend(two_pages());
        let index = PageIndex::build(&elements);

        assert_eq!(index.len(), 2);
        assert_eq!(index.leading_len(), 1);
        let a = index.range("A").unwrap();
        assert_eq!(a.content(), 2..4);
        assert_eq!(a.full(), 1..4);
        assert_eq!(index.range("B").unwrap().content(), 5..6);
        assert_eq!(index.owner_of(0), None);
        assert_eq!(index.owner_of(3).map(|r| r.id.as_str()), Some("A"));
        assert_eq!(index.owner_of(5).map(|r| r.id.as_str()), Some("B"));
        assert_eq!(index.owner_of(6), None);
    }

    #[test]
    fn test_page_index_live_ids_coalesce() {
        let elements = vec![page("A"), page("A"), page("X").soft_deleted(), page("B")];
        let index = PageIndex::build(&elements);
        assert_eq!(index.live_ids(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(index.duplicate_page_ids(), vec!["A"]);
    }
}
