//! Chat prompt rendering.

use codex_core::{ChatRole, ChatTurn};

const USER_TAG: &str = "user";
const ASSISTANT_TAG: &str = "assistant";

/// Render turns into the single-string prompt the local models expect.
///
/// `user` turns get the `user` tag; system and assistant turns both share the
/// `assistant` tag. A trailing empty `assistant` tag marks where completion starts.
pub fn format_chat(turns: &[ChatTurn]) -> String {
    let mut prompt = String::new();
    for turn in turns {
        let tag = match turn.role() {
            ChatRole::User => USER_TAG,
            ChatRole::System | ChatRole::Assistant => ASSISTANT_TAG,
        };
        prompt.push_str(&format!("<|{tag}|>\n{}\n", turn.content()));
    }
    prompt.push_str(&format!("<|{ASSISTANT_TAG}|>\n"));
    prompt
}
