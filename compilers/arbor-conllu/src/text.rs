use arbor_protocol::{SentenceTree, TokenId};

/// Rebuilds the running text of a sentence.
///
/// A multiword group stands in for the words it spans, and a space follows
/// every surface token unless its MISC says `SpaceAfter=No`.
pub fn surface_text(tree: &SentenceTree) -> String {
    let mut text = String::new();
    let mut groups = tree.groups().iter().peekable();
    let mut covered_until = 0;

    for token in tree.nodes() {
        let word = token.id.as_normal().unwrap_or_default();
        if word <= covered_until {
            continue;
        }
        // groups nested in an already emitted range
        while groups
            .next_if(|group| matches!(group.id, TokenId::Group { start, .. } if start < word))
            .is_some()
        {}

        let surface = match groups.next_if(|group| {
            matches!(group.id, TokenId::Group { start, .. } if start == word)
        }) {
            Some(group) => {
                if let TokenId::Group { end, .. } = group.id {
                    covered_until = end;
                }
                group
            }
            None => token,
        };

        text.push_str(&surface.form);
        if surface.misc.get("SpaceAfter") != Some("No") {
            text.push(' ');
        }
    }

    text.truncate(text.trim_end().len());
    text
}
