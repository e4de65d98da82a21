/// Whether the host should cancel the browser's default handling of an
/// event. Drag events over the page always cancel it so a dropped file never
/// navigates away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposition {
    pub prevent_default: bool,
}

const CONSUMED: Disposition = Disposition {
    prevent_default: true,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DropZone {
    hovering: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn on_drag_over(&mut self) -> Disposition {
        self.hovering = true;
        CONSUMED
    }

    pub fn on_drag_leave(&mut self) -> Disposition {
        self.hovering = false;
        CONSUMED
    }

    pub fn on_drop<T>(&mut self, files: Vec<T>, handler: impl FnOnce(Vec<T>)) -> Disposition {
        self.hovering = false;
        if !files.is_empty() {
            handler(files);
        }
        CONSUMED
    }
}
