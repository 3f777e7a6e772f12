use askama::Template;

use crate::flash::Flash;

// Simple monochrome templates (no external CSS/JS)

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>cardlink</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
      body{font-family:Courier New,monospace;background:#fff;color:#000}
      main{max-width:560px;margin:4rem auto;text-align:center}
      label,input,textarea,button{display:block;margin:0.6rem auto}
      input[type=text],input[type=url],textarea{width:100%}
      .flash{border:1px solid #000;padding:0.6rem}
      .flash-danger{background:#000;color:#fff}
    </style>
  </head>
  <body>
    <main>
      <h1>cardlink</h1>
      {% if let Some(flash) = flash %}
      <p class="flash flash-{{ flash.category }}">{{ flash.message }}</p>
      {% endif %}
      <form action="/" method="post" enctype="multipart/form-data">
        <label>Destination URL:
          <input type="url" name="link" required>
        </label>
        <label>Preview Title:
          <input type="text" name="preview_text" required>
        </label>
        <label>Preview Description:
          <textarea name="preview_description" rows="3"></textarea>
        </label>
        <label>Preview Image (PNG, JPG, JPEG, GIF):
          <input type="file" name="preview_image_file" accept=".png,.jpg,.jpeg,.gif" required>
        </label>
        <button type="submit">Create</button>
      </form>
    </main>
  </body>
</html>"#, ext = "html")]
pub struct CreateTemplate {
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>cardlink: link created</title>
    <style>
      body{font-family:Courier New,monospace;background:#fff;color:#000}
      main{max-width:560px;margin:4rem auto;text-align:center}
      a{color:#000}
      .qr{margin-top:1rem}
    </style>
  </head>
  <body>
    <main>
      <h1>Short link created</h1>
      <p><strong>{{ short_id }}</strong></p>
      <p><a href="{{ shortlink }}">{{ shortlink }}</a></p>
      {% if let Some(svg) = qr_svg %}
      <div class="qr">{{ svg|safe }}</div>
      {% endif %}
      <p><a href="/">Create another</a></p>
    </main>
  </body>
</html>"#, ext = "html")]
pub struct SuccessTemplate {
    pub short_id: String,
    pub shortlink: String,
    pub qr_svg: Option<String>,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{{ description }}">
    <link rel="canonical" href="{{ page_url }}">
    <meta property="og:type" content="website">
    <meta property="og:title" content="{{ title }}">
    <meta property="og:description" content="{{ description }}">
    <meta property="og:url" content="{{ page_url }}">
    <meta property="og:image" content="{{ image_url }}">
    <meta name="twitter:card" content="summary_large_image">
    <meta name="twitter:title" content="{{ title }}">
    <meta name="twitter:description" content="{{ description }}">
    <meta name="twitter:image" content="{{ image_url }}">
    <meta http-equiv="refresh" content="0; url={{ link }}">
  </head>
  <body style="font-family:Courier New,monospace;background:#fff;color:#000;text-align:center">
    <p>Redirecting to <a href="{{ link }}">{{ link }}</a></p>
  </body>
</html>"#, ext = "html")]
pub struct RedirectTemplate {
    pub link: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub page_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_form_shows_flash() {
        let html = CreateTemplate {
            flash: Some(Flash::danger("Nope <b>")),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"<p class="flash flash-danger">"#));
        assert!(html.contains("Nope &lt;b&gt;"));
        assert!(html.contains(r#"name="preview_image_file""#));

        let html = CreateTemplate { flash: None }.render().unwrap();
        assert!(!html.contains(r#"class="flash flash-danger""#));
    }

    #[test]
    fn redirect_page_carries_card_tags() {
        let html = RedirectTemplate {
            link: "https://example.com".into(),
            title: "Hello".into(),
            description: "World".into(),
            image_url: "http://localhost:2000/uploads/a.png".into(),
            page_url: "http://localhost:2000/s/Ab12Cd".into(),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"<meta property="og:title" content="Hello">"#));
        assert!(html.contains(r#"<meta property="og:description" content="World">"#));
        assert!(html.contains(r#"content="0; url=https:&#x2f;&#x2f;example.com""#)
            || html.contains(r#"content="0; url=https://example.com""#));
    }
}
