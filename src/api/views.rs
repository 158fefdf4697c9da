use maud::{html, Markup, PreEscaped, DOCTYPE};
use pulldown_cmark::{html::push_html, Event, Options, Parser};
use std::collections::HashSet;

use crate::domain::{Message, MessageRole};
use crate::infrastructure::UiConfig;

const CSS: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; color: #262730; }
aside { width: 18rem; background: #f0f2f6; padding: 1.5rem; box-sizing: border-box; }
main { flex: 1; max-width: 46rem; margin: 0 auto; padding: 2rem 1rem 7rem; }
.caption { color: #808495; margin-top: -0.5rem; }
.message { display: flex; gap: 0.75rem; padding: 0.75rem; border-radius: 0.5rem; margin: 0.5rem 0; }
.message.user { background: #f7f8fa; }
.avatar { font-size: 1.4rem; line-height: 1.6rem; }
.content > :first-child { margin-top: 0; }
.content > :last-child { margin-bottom: 0; }
.error { background: #ffecec; color: #7d1a1a; border-radius: 0.5rem; padding: 0.75rem; white-space: pre-wrap; }
form.prompt { position: fixed; bottom: 1.5rem; left: 19rem; right: 1rem; max-width: 46rem; margin: 0 auto; display: flex; gap: 0.5rem; }
form.prompt input { flex: 1; padding: 0.75rem; border: 1px solid #d5d6db; border-radius: 0.5rem; font-size: 1rem; }
button { padding: 0.6rem 1rem; border: 0; border-radius: 0.5rem; background: #ff4b4b; color: white; cursor: pointer; }
button:disabled { background: #c9c9cf; }
"#;

const THINKING_JS: &str = r#"
document.querySelector("form.prompt").addEventListener("submit", function (e) {
  if (!this.prompt.value.trim()) { e.preventDefault(); return; }
  var button = this.querySelector("button");
  button.disabled = true;
  button.textContent = "Thinking...";
});
"#;

/// Full chat page: sidebar, title, history and the single input.
pub fn chat_page(ui: &UiConfig, messages: &[Message], error: Option<&str>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (ui.title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                aside {
                    (markdown(&ui.sidebar))
                    form method="post" action="/clear" {
                        button type="submit" { "Clear conversation" }
                    }
                }
                main {
                    h1 { (ui.title) }
                    p.caption { (ui.caption) }
                    @for message in messages {
                        (message_view(message))
                    }
                    @if let Some(error) = error {
                        div.error role="alert" { (error) }
                    }
                    form.prompt method="post" action="/chat" {
                        input type="text" name="prompt" placeholder=(ui.placeholder)
                            autocomplete="off" autofocus;
                        button type="submit" { "Send" }
                    }
                }
                script { (PreEscaped(THINKING_JS)) }
            }
        }
    }
}

fn message_view(message: &Message) -> Markup {
    let (class, avatar) = match message.role {
        MessageRole::User => ("message user", "🧑"),
        MessageRole::Assistant => ("message assistant", "🤖"),
    };

    html! {
        div class=(class) data-role=(message.role.as_str()) {
            span.avatar { (avatar) }
            div.content { (markdown(&message.content)) }
        }
    }
}

/// CommonMark to HTML with raw HTML in the source rendered as text. The output
/// is sanitized: links keep only http, https and mailto targets, and images
/// are dropped so nothing is fetched from a remote host.
pub fn markdown(text: &str) -> Markup {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            other => other,
        });

    let mut out = String::new();
    push_html(&mut out, parser);
    PreEscaped(sanitize(&out))
}

fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .rm_tags(std::iter::once("img"))
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .clean(html)
        .to_string()
}
