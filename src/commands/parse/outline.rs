use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    pub level: u8,
    pub text: String,
    pub children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn has_child_at(&self, level: u8) -> bool {
        self.children.iter().any(|child| child.level == level)
    }
}

fn close_top(stack: &mut Vec<HeadingNode>, roots: &mut Vec<HeadingNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Nests a flat heading stream: each heading becomes a child of the nearest
/// preceding heading with a lower level.
pub fn build_heading_tree(headings: &[(u8, String)]) -> Vec<HeadingNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<HeadingNode> = Vec::new();

    for (level, text) in headings {
        while stack.last().is_some_and(|open| open.level >= *level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(HeadingNode {
            level: *level,
            text: text.clone(),
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

/// Normalized heading text of the document, with table-of-contents entries
/// and levels past 4 dropped.
pub fn outline_headings(document: &Document) -> Vec<(u8, String)> {
    document
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(paragraph) if !paragraph.toc => paragraph
                .heading
                .filter(|level| (1..=4).contains(level))
                .map(|level| (level, normalize_cell_text(&paragraph.text))),
            _ => None,
        })
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

type LocationKey = (String, String, String);

/// City -> neighborhood -> locations, as declared by the heading outline.
/// The empty neighborhood holds locations with no neighborhood above them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineMap {
    cities: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    years: BTreeMap<LocationKey, BTreeSet<String>>,
}

impl OutlineMap {
    pub fn from_headings(headings: &[(u8, String)]) -> Self {
        let mut outline = Self::default();

        for root in build_heading_tree(headings) {
            if root.level == 1 {
                outline.cities.entry(root.text.clone()).or_default();
                for child in &root.children {
                    outline.add_section(&root.text, child);
                }
            } else {
                outline.add_section("", &root);
            }
        }

        outline
    }

    fn add_section(&mut self, city: &str, node: &HeadingNode) {
        match node.level {
            2 if node.has_child_at(3) => {
                self.neighborhoods_mut(city)
                    .entry(node.text.clone())
                    .or_default();
                for child in node.children.iter().filter(|child| child.level == 3) {
                    self.add_location(city, &node.text, child);
                }
            }
            2 | 3 => self.add_location(city, "", node),
            _ => {}
        }
    }

    fn add_location(&mut self, city: &str, neighborhood: &str, node: &HeadingNode) {
        self.neighborhoods_mut(city)
            .entry(neighborhood.to_string())
            .or_default()
            .insert(node.text.clone());

        let key = (
            city.to_string(),
            neighborhood.to_string(),
            node.text.clone(),
        );
        let years = self.years.entry(key).or_default();
        for child in node.children.iter().filter(|child| child.level == 4) {
            years.insert(child.text.clone());
        }
    }

    fn neighborhoods_mut(&mut self, city: &str) -> &mut BTreeMap<String, BTreeSet<String>> {
        self.cities.entry(city.to_string()).or_default()
    }

    pub fn is_neighborhood(&self, city: &str, text: &str) -> bool {
        !text.is_empty()
            && self
                .cities
                .get(city)
                .is_some_and(|neighborhoods| neighborhoods.contains_key(text))
    }

    pub fn locations(&self, city: &str, neighborhood: &str) -> Option<&BTreeSet<String>> {
        self.cities.get(city)?.get(neighborhood)
    }

    pub fn contains_location(&self, city: &str, neighborhood: &str, location: &str) -> bool {
        self.locations(city, neighborhood)
            .is_some_and(|locations| locations.contains(location))
    }

    pub fn years(&self, city: &str, neighborhood: &str, location: &str) -> Option<&BTreeSet<String>> {
        self.years.get(&(
            city.to_string(),
            neighborhood.to_string(),
            location.to_string(),
        ))
    }
}
