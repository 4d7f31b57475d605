//! Sidebar navigation.

use serde::Serialize;

/// A link to one registered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewMenu {
    /// Display name (the view's plural name).
    pub name: String,
    /// The view identity used in URLs.
    pub identity: String,
    /// Optional icon class.
    pub icon: Option<String>,
}

/// A top-level sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuItem {
    /// A direct link to a view.
    View(ViewMenu),
    /// A named group of views.
    Category {
        /// Category label.
        name: String,
        /// Optional icon class.
        icon: Option<String>,
        /// Views listed under the category.
        children: Vec<ViewMenu>,
    },
}

impl MenuItem {
    /// The label of this entry.
    pub fn name(&self) -> &str {
        match self {
            Self::View(view) => &view.name,
            Self::Category { name, .. } => name,
        }
    }

    /// Returns true if this entry is, or contains, the view `identity`.
    pub fn is_active(&self, identity: &str) -> bool {
        match self {
            Self::View(view) => view.identity == identity,
            Self::Category { children, .. } => children.iter().any(|c| c.identity == identity),
        }
    }
}

/// The ordered sidebar of an admin site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
    /// Entries in registration order.
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Creates an empty menu.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds an entry.
    ///
    /// A category whose name is already present merges its children into
    /// the existing category. The first icon set for a category wins.
    pub fn add(&mut self, item: MenuItem) {
        if let MenuItem::Category {
            name,
            icon,
            children,
        } = &item
        {
            let existing = self.items.iter_mut().find_map(|entry| match entry {
                MenuItem::Category {
                    name: existing,
                    icon: existing_icon,
                    children: existing_children,
                } if *existing == *name => Some((existing_icon, existing_children)),
                _ => None,
            });
            if let Some((existing_icon, existing_children)) = existing {
                if existing_icon.is_none() {
                    existing_icon.clone_from(icon);
                }
                existing_children.extend(children.iter().cloned());
                return;
            }
        }
        self.items.push(item);
    }

    /// Removes every link to `identity`, dropping categories left empty.
    pub fn remove(&mut self, identity: &str) {
        self.items.retain_mut(|item| match item {
            MenuItem::View(view) => view.identity != identity,
            MenuItem::Category { children, .. } => {
                children.retain(|c| c.identity != identity);
                !children.is_empty()
            }
        });
    }

    /// Returns true if any entry links to `identity`.
    pub fn is_active(&self, identity: &str) -> bool {
        self.items.iter().any(|item| item.is_active(identity))
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the menu has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, identity: &str) -> ViewMenu {
        ViewMenu {
            name: name.to_string(),
            identity: identity.to_string(),
            icon: None,
        }
    }

    fn category(name: &str, children: Vec<ViewMenu>) -> MenuItem {
        MenuItem::Category {
            name: name.to_string(),
            icon: None,
            children,
        }
    }

    #[test]
    fn test_add_views_in_order() {
        let mut menu = Menu::new();
        menu.add(MenuItem::View(view("Users", "user")));
        menu.add(MenuItem::View(view("Posts", "post")));
        assert_eq!(menu.len(), 2);
        assert_eq!(menu.items[0].name(), "Users");
        assert_eq!(menu.items[1].name(), "Posts");
    }

    #[test]
    fn test_categories_merge() {
        let mut menu = Menu::new();
        menu.add(category("Accounts", vec![view("Users", "user")]));
        menu.add(MenuItem::View(view("Posts", "post")));
        menu.add(category("Accounts", vec![view("Groups", "group")]));

        assert_eq!(menu.len(), 2);
        match &menu.items[0] {
            MenuItem::Category { name, children, .. } => {
                assert_eq!(name, "Accounts");
                let ids: Vec<_> = children.iter().map(|c| c.identity.as_str()).collect();
                assert_eq!(ids, vec!["user", "group"]);
            }
            MenuItem::View(_) => panic!("expected a category"),
        }
    }

    #[test]
    fn test_category_icon_first_wins() {
        let mut menu = Menu::new();
        menu.add(category("Accounts", vec![view("Users", "user")]));
        menu.add(MenuItem::Category {
            name: "Accounts".into(),
            icon: Some("fa-users".into()),
            children: vec![view("Groups", "group")],
        });
        menu.add(MenuItem::Category {
            name: "Accounts".into(),
            icon: Some("fa-other".into()),
            children: vec![],
        });
        match &menu.items[0] {
            MenuItem::Category { icon, .. } => assert_eq!(icon.as_deref(), Some("fa-users")),
            MenuItem::View(_) => panic!("expected a category"),
        }
    }

    #[test]
    fn test_is_active() {
        let mut menu = Menu::new();
        menu.add(category("Accounts", vec![view("Users", "user")]));
        menu.add(MenuItem::View(view("Posts", "post")));
        assert!(menu.items[0].is_active("user"));
        assert!(!menu.items[0].is_active("post"));
        assert!(menu.is_active("post"));
        assert!(!menu.is_active("missing"));
    }

    #[test]
    fn test_remove() {
        let mut menu = Menu::new();
        menu.add(category("Accounts", vec![view("Users", "user")]));
        menu.add(MenuItem::View(view("Posts", "post")));
        menu.remove("user");
        assert_eq!(menu.len(), 1);
        assert_eq!(menu.items[0].name(), "Posts");
    }

    #[test]
    fn test_serialize_tagged() {
        let item = MenuItem::View(view("Users", "user"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "view");
        assert_eq!(json["identity"], "user");
    }
}
