//! `setTimeout`-backed flash timers

use crate::dom_tree::DomTree;
use span_anchor::{AnchorError, FlashAction, FlashTimers};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::{Node, Window};

/// Runs flash actions on the window's timer queue. Each callback holds its
/// own handle to the document.
///
/// Callbacks stay owned here until they are cancelled or have run; ones
/// that ran are released on the next `schedule`.
#[derive(Debug, Clone)]
pub struct WindowTimers {
    window: Window,
    tree: DomTree,
    callbacks: Rc<RefCell<HashMap<i32, Closure<dyn FnMut()>>>>,
    fired: Rc<RefCell<Vec<i32>>>,
}

impl WindowTimers {
    pub fn new(tree: DomTree) -> Result<Self, AnchorError> {
        let window = web_sys::window()
            .ok_or_else(|| AnchorError::Timer("No window object available".to_string()))?;
        Ok(Self {
            window,
            tree,
            callbacks: Rc::new(RefCell::new(HashMap::new())),
            fired: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// Callbacks still held, excluding ones known to have run
    pub fn pending_callbacks(&self) -> usize {
        self.release_fired();
        self.callbacks.borrow().len()
    }

    fn release_fired(&self) {
        let fired: Vec<i32> = self.fired.borrow_mut().drain(..).collect();
        let mut callbacks = self.callbacks.borrow_mut();
        for handle in fired {
            callbacks.remove(&handle);
        }
    }
}

impl FlashTimers<Node> for WindowTimers {
    type Handle = i32;

    fn schedule(&mut self, delay: Duration, action: FlashAction<Node>) -> Result<i32, AnchorError> {
        self.release_fired();

        let mut tree = self.tree.clone();
        let own_handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let fired = self.fired.clone();
        let slot = own_handle.clone();
        let callback = Closure::once(move || {
            action.apply(&mut tree);
            if let Some(handle) = slot.get() {
                fired.borrow_mut().push(handle);
            }
        });

        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis,
            )
            .map_err(|e| AnchorError::Timer(format!("setTimeout failed: {:?}", e)))?;
        own_handle.set(Some(handle));
        self.callbacks.borrow_mut().insert(handle, callback);
        Ok(handle)
    }

    fn cancel(&mut self, handle: &i32) {
        self.window.clear_timeout_with_handle(*handle);
        self.callbacks.borrow_mut().remove(handle);
    }
}
