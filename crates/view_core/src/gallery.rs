use std::collections::HashSet;

use shared::domain::ImageRef;

/// Ordered images (display order, newest upload first) plus the selection
/// pointer. The selection is `None` exactly when the list is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryModel {
    images: Vec<ImageRef>,
    selected: Option<usize>,
    uploaded: HashSet<String>,
}

impl GalleryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listing(images: Vec<ImageRef>) -> Self {
        let mut gallery = Self::new();
        gallery.replace(images);
        gallery
    }

    pub fn list(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        self.selected.and_then(|idx| self.images.get(idx))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.images.iter().position(|image| image.name == name)
    }

    /// Inserts a freshly uploaded image at the front and selects it. A previous
    /// entry with the same name is replaced, since the backend overwrites it.
    pub fn add_uploaded(&mut self, image: ImageRef) {
        if let Some(existing) = self.position(&image.name) {
            self.images.remove(existing);
        }
        self.uploaded.insert(image.name.clone());
        self.images.insert(0, image);
        self.selected = Some(0);
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn select_index(&mut self, idx: usize) -> bool {
        if idx < self.images.len() {
            self.selected = Some(idx);
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn prev(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let len = self.images.len();
        if len == 0 {
            return false;
        }
        let current = self.selected.unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        self.selected = Some(next);
        true
    }

    /// Replaces the list with a fresh listing and re-resolves the selection by
    /// name. Images uploaded in this session that the listing does not contain
    /// yet are kept at the front, so a listing requested before an upload
    /// finished cannot drop it.
    pub fn replace(&mut self, images: Vec<ImageRef>) {
        let selected_name = self.selected().map(|image| image.name.clone());

        let mut merged: Vec<ImageRef> = {
            let listed: HashSet<&str> = images.iter().map(|image| image.name.as_str()).collect();
            self.images
                .iter()
                .filter(|image| {
                    self.uploaded.contains(&image.name) && !listed.contains(image.name.as_str())
                })
                .cloned()
                .collect()
        };
        let mut seen: HashSet<String> = merged.iter().map(|image| image.name.clone()).collect();
        for image in images {
            if seen.insert(image.name.clone()) {
                merged.push(image);
            }
        }

        self.images = merged;
        self.selected = selected_name
            .and_then(|name| self.position(&name))
            .or(if self.images.is_empty() { None } else { Some(0) });
    }

    pub fn remove(&mut self, name: &str) -> Option<ImageRef> {
        let idx = self.position(name)?;
        let removed = self.images.remove(idx);
        self.uploaded.remove(name);
        self.selected = match self.selected {
            _ if self.images.is_empty() => None,
            Some(current) if current > idx => Some(current - 1),
            Some(current) if current == idx => Some(idx.min(self.images.len() - 1)),
            other => other,
        };
        Some(removed)
    }
}
