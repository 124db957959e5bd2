use bar_core::{BarError, Block, ClickEvent, Clickable, Result, Widget};

/// Shows one of several widgets; each click moves on to the next.
pub struct Rotator {
    widgets: Vec<Box<dyn Widget>>,
}

impl Rotator {
    pub fn new(widgets: Vec<Box<dyn Widget>>) -> Result<Self> {
        if widgets.is_empty() {
            return Err(BarError::Config("rotate needs at least one widget".into()));
        }
        Ok(Self { widgets })
    }
}

impl Widget for Rotator {
    fn name(&self) -> &str {
        "rotate"
    }

    fn status(&mut self) -> Result<Block> {
        match self.widgets.first_mut() {
            Some(current) => current.status(),
            None => Ok(Block::default()),
        }
    }

    fn clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(self)
    }
}

impl Clickable for Rotator {
    fn click(&mut self, _event: &ClickEvent) -> bool {
        self.widgets.rotate_left(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(r: &Rotator) -> Vec<&str> {
        r.widgets.iter().map(|w| w.name()).collect()
    }

    struct Named(&'static str);

    impl Widget for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn status(&mut self) -> Result<Block> {
            Ok(Block::new(self.0))
        }
    }

    #[test]
    fn click_moves_current_to_the_end() {
        let widgets: Vec<Box<dyn Widget>> = vec![
            Box::new(Named("X")),
            Box::new(Named("Y")),
            Box::new(Named("Z")),
        ];
        let mut r = Rotator::new(widgets).unwrap();
        assert_eq!(r.status().unwrap().full_text, "X");

        let redraw = r.clickable().unwrap().click(&ClickEvent::default());
        assert!(redraw);
        assert_eq!(r.status().unwrap().full_text, "Y");
        assert_eq!(order(&r), ["Y", "Z", "X"]);

        r.clickable().unwrap().click(&ClickEvent::default());
        r.clickable().unwrap().click(&ClickEvent::default());
        assert_eq!(r.status().unwrap().full_text, "X");
    }

    #[test]
    fn empty_rotation_is_rejected() {
        assert!(Rotator::new(Vec::new()).is_err());
    }
}
