use serde::Serialize;

/// Block Kit `plain_text` object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { kind: "plain_text", text: text.into(), emoji: None }
    }

    pub fn plain_emoji(text: impl Into<String>) -> Self {
        Self { kind: "plain_text", text: text.into(), emoji: Some(true) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        action_id: String,
        multiline: bool,
        placeholder: TextObject,
    },
    StaticSelect {
        action_id: String,
        placeholder: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_option: Option<SelectOption>,
        options: Vec<SelectOption>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Divider,
    Input { block_id: String, element: InputElement, label: TextObject },
}

/// A `modal` view payload for `views.open` / `views.update`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    pub view_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
    pub blocks: Vec<Block>,
}

impl ModalView {
    pub fn callback_id(&self) -> Option<&str> {
        self.callback_id.as_deref()
    }

    pub fn section_texts(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text } => Some(text.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub struct ModalBuilder {
    view: ModalView,
}

impl ModalBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            view: ModalView {
                view_type: "modal",
                callback_id: None,
                title: TextObject::plain(title),
                submit: None,
                private_metadata: None,
                blocks: Vec::new(),
            },
        }
    }

    pub fn callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.view.callback_id = Some(callback_id.into());
        self
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.view.submit = Some(TextObject::plain(label));
        self
    }

    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.view.private_metadata = Some(metadata.into());
        self
    }

    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.view.blocks.push(Block::Section { text: TextObject::plain(text) });
        self
    }

    pub fn divider(mut self) -> Self {
        self.view.blocks.push(Block::Divider);
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: TextObject,
        element: InputElement,
    ) -> Self {
        self.view.blocks.push(Block::Input { block_id: block_id.into(), element, label });
        self
    }

    pub fn build(self) -> ModalView {
        self.view
    }
}
