//! Per-render mutable state.

/// Link discovered while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub title: String,
}

/// Plain image discovered while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub alt: String,
    pub src: String,
    pub title: String,
}

/// Image wrapped by a link, or a bare shield image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub alt: String,
    pub src: String,
    pub href: String,
}

/// Output of a render pass together with everything the classifier found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub badges: Vec<Badge>,
}

/// Open list being rendered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListFrame {
    pub ordered: bool,
    pub num: usize,
    /// Parser level of the list open token.
    pub level: Option<usize>,
    /// How many lists of the same kind directly precede this one. Odd
    /// shifts switch the bullet or delimiter so siblings stay separate lists.
    pub shift: usize,
}

/// Open list item: where its body starts in the output and how far its
/// continuation lines are indented.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemFrame {
    pub start: usize,
    pub width: usize,
}

/// What a `link_close` has to emit.
#[derive(Debug, Clone)]
pub(crate) enum LinkFrame {
    Link { href: String, title: String },
    /// The image rule already rendered the whole composite.
    Badge,
}

/// Table position flags.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Inside {
    pub table: bool,
    pub thead: bool,
    pub tr: bool,
    pub th: bool,
}

/// Mutable state threaded through one render call.
///
/// A fresh context is built for every [`Renderer`](super::Renderer), so no
/// counters, flags or collected links leak between unrelated renders.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub(crate) lists: Vec<ListFrame>,
    pub(crate) items: Vec<ItemFrame>,
    /// Most recently closed list, read when a sibling list opens.
    pub(crate) closed_list: Option<ListFrame>,
    pub(crate) inside: Inside,
    /// Set while a `**` run is open: whether the token before it was text.
    pub(crate) strong: Option<bool>,
    pub(crate) align: Vec<&'static str>,
    pub(crate) link_stack: Vec<LinkFrame>,
    /// Output offsets where open blockquotes begin.
    pub(crate) quotes: Vec<usize>,
    pub(crate) links: Vec<Link>,
    pub(crate) images: Vec<Image>,
    pub(crate) badges: Vec<Badge>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of links collected so far.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of plain images collected so far.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of badges collected so far.
    pub fn badge_count(&self) -> usize {
        self.badges.len()
    }

    pub(crate) fn ordered(&self) -> bool {
        self.lists.last().is_some_and(|frame| frame.ordered)
    }

    /// Sibling shift of the innermost list.
    pub(crate) fn list_shift(&self) -> usize {
        self.lists.last().map_or(0, |frame| frame.shift)
    }

    /// Returns the next ordinal of the innermost ordered list.
    pub(crate) fn next_ordinal(&mut self) -> usize {
        match self.lists.last_mut() {
            Some(frame) => {
                let num = frame.num;
                frame.num += 1;
                num
            }
            None => 1,
        }
    }

    /// Consumes the context into the report for `text`.
    pub(crate) fn finish(self, text: String) -> Rendered {
        Rendered {
            text,
            links: self.links,
            images: self.images,
            badges: self.badges,
        }
    }
}
