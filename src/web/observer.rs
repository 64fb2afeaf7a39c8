//! Subtree insertion observer over `MutationObserver`.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord, Node};

use crate::error::Result;

/// Calls back for every element inserted under a root. Disconnects on drop.
pub struct InsertionObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl std::fmt::Debug for InsertionObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertionObserver").finish_non_exhaustive()
    }
}

impl InsertionObserver {
    pub fn start(root: &Element, mut on_insert: impl FnMut(&Element) + 'static) -> Result<Self> {
        let callback = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
            for record in records.iter() {
                let record: MutationRecord = record.unchecked_into();
                let added = record.added_nodes();
                for i in 0..added.length() {
                    if let Some(el) = added.get(i).and_then(|n: Node| n.dyn_into::<Element>().ok()) {
                        on_insert(&el);
                    }
                }
            }
        }) as Box<dyn FnMut(Array, MutationObserver)>);

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(root, &init)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for InsertionObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
