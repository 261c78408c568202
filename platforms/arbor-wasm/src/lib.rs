use std::rc::Rc;

use arbor_state::protocol::SentenceState;
use arbor_state::{HistoryConfig, Observer, ObserverError, ReactiveSentence, SentenceConfig, SentenceHistory};
use js_sys::Function;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[derive(Debug, thiserror::Error)]
#[error("subscriber threw: {0}")]
pub struct CallbackError(String);

fn same_function(a: &Function, b: &Function) -> bool {
    let (a, b): (&JsValue, &JsValue) = (a.as_ref(), b.as_ref());
    a == b
}

/// A JavaScript function subscribed to sentence changes. It is called with no
/// arguments and is expected to pull what it needs from the editor.
struct JsObserver {
    callback: Function,
}

impl Observer for JsObserver {
    fn update(&self, _sentence: &ReactiveSentence) -> Result<(), ObserverError> {
        self.callback
            .call0(&JsValue::NULL)
            .map(drop)
            .map_err(|err| {
                let message = err.as_string().unwrap_or_else(|| format!("{:?}", err));
                CallbackError(message).into()
            })
    }
}

/// Sentence being annotated in the browser, with its undo history.
#[wasm_bindgen]
pub struct SentenceEditor {
    sentence: ReactiveSentence,
    history: SentenceHistory,
    subscribers: Vec<(Function, Rc<dyn Observer>)>,
}

impl Default for SentenceEditor {
    fn default() -> Self {
        Self::new(false, None)
    }
}

#[wasm_bindgen]
impl SentenceEditor {
    /// `max_snapshots` of `undefined` keeps the whole history.
    #[wasm_bindgen(constructor)]
    pub fn new(verbose: bool, max_snapshots: Option<u32>) -> Self {
        let mut history = HistoryConfig::default().with_verbose(verbose);
        if let Some(max) = max_snapshots {
            history = history.with_max_snapshots(max as usize);
        }
        Self {
            sentence: ReactiveSentence::with_config(SentenceConfig::default().with_verbose(verbose)),
            history: SentenceHistory::with_config(history),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: Function) {
        if self.subscribers.iter().any(|(known, _)| same_function(known, &callback)) {
            return;
        }
        let observer: Rc<dyn Observer> = Rc::new(JsObserver {
            callback: callback.clone(),
        });
        self.sentence.attach(observer.clone());
        self.subscribers.push((callback, observer));
    }

    pub fn unsubscribe(&mut self, callback: &Function) -> bool {
        let Some(index) = self.subscribers.iter().position(|(known, _)| same_function(known, callback)) else {
            return false;
        };
        let (_, observer) = self.subscribers.remove(index);
        self.sentence.detach(&observer)
    }

    // --- loading and export ---

    #[wasm_bindgen(js_name = loadText)]
    pub fn load_text(&mut self, text: &str) -> Result<(), JsError> {
        self.sentence.from_text(text)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = exportText)]
    pub fn export_text(&self) -> String {
        self.sentence.export_text()
    }

    /// The full sentence as a plain JS object.
    pub fn state(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(self.sentence.state())
            .map_err(|err| JsError::new(&err.to_string()))
    }

    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&mut self, value: JsValue) -> Result<(), JsError> {
        let state: SentenceState =
            serde_wasm_bindgen::from_value(value).map_err(|err| JsError::new(&err.to_string()))?;
        self.sentence.update_sentence(&state)?;
        Ok(())
    }

    // --- edits ---

    #[wasm_bindgen(js_name = removeToken)]
    pub fn remove_token(&mut self, id: u32) -> Result<(), JsError> {
        self.sentence.remove_token(id)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = splitTokenBefore)]
    pub fn split_token_before(&mut self, id: u32) -> Result<(), JsError> {
        self.sentence.split_token_before(id)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = splitTokenAfter)]
    pub fn split_token_after(&mut self, id: u32) -> Result<(), JsError> {
        self.sentence.split_token_after(id)?;
        Ok(())
    }

    /// Returns the ID of the new word.
    #[wasm_bindgen(js_name = appendEmptyToken)]
    pub fn append_empty_token(&mut self) -> Result<String, JsError> {
        Ok(self.sentence.append_empty_token()?.to_string())
    }

    #[wasm_bindgen(js_name = toggleBooleanFeature)]
    pub fn toggle_boolean_feature(&mut self, id: u32, feature: &str) -> Result<bool, JsError> {
        Ok(self.sentence.toggle_boolean_feature(id, feature)?)
    }

    // --- history ---

    pub fn backup(&mut self) -> Result<(), JsError> {
        self.history.backup(&self.sentence)?;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, JsError> {
        Ok(self.history.undo(&mut self.sentence)?)
    }

    pub fn redo(&mut self) -> Result<bool, JsError> {
        Ok(self.history.redo(&mut self.sentence)?)
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[wasm_bindgen(js_name = currentIndex)]
    pub fn current_index(&self) -> Option<u32> {
        self.history.current_index().map(|index| index as u32)
    }

    /// Snapshot names, oldest first.
    #[wasm_bindgen(js_name = historyNames)]
    pub fn history_names(&self) -> Vec<String> {
        (0..self.history.len())
            .filter_map(|index| self.history.get(index))
            .map(|memento| memento.name())
            .collect()
    }

    // --- views ---

    #[wasm_bindgen(js_name = plainText)]
    pub fn plain_text(&self) -> String {
        self.sentence.plain_text()
    }

    #[wasm_bindgen(js_name = underscoredText)]
    pub fn underscored_text(&self) -> String {
        self.sentence.underscored_text()
    }

    #[wasm_bindgen(js_name = featureKeys)]
    pub fn feature_keys(&self) -> Vec<String> {
        self.sentence.feature_keys()
    }
}
