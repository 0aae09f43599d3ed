//! HTML for the three pages the service renders.

pub const DOWNLOAD_FILE_NAME: &str = "zombie-me.png";

const BASE_STYLE: &str = r#"
      * { margin: 0; padding: 0; box-sizing: border-box; }
      body {
        font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
        background: transparent;
        color: #2d3748;
        padding: 20px;
        text-align: center;
        line-height: 1.6;
      }
      .gradient-text {
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        -webkit-background-clip: text;
        -webkit-text-fill-color: transparent;
        background-clip: text;
      }
      .button {
        display: inline-block;
        padding: 14px 28px;
        text-decoration: none;
        border: none;
        border-radius: 10px;
        font-weight: 600;
        font-size: 15px;
        color: #ffffff;
        cursor: pointer;
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        box-shadow: 0 4px 10px rgba(102, 126, 234, 0.3);
        transition: all 0.3s ease;
      }
      .button:hover { transform: translateY(-2px); box-shadow: 0 6px 15px rgba(102, 126, 234, 0.4); }
"#;

const INDEX_STYLE: &str = r#"
      .container { max-width: 600px; margin: 0 auto; }
      h2 { font-size: 2em; font-weight: 700; margin-bottom: 12px; }
      .subtitle { color: #718096; margin-bottom: 30px; }
      .upload-container {
        background: #ffffff;
        border: 2px dashed #cbd5e0;
        border-radius: 16px;
        padding: 40px 30px;
        box-shadow: 0 4px 6px rgba(0, 0, 0, 0.05);
      }
      .upload-container:hover { border-color: #667eea; }
      input[type="file"] { position: absolute; left: -9999px; }
      .file-input-label {
        display: inline-block;
        margin: 20px 0;
        padding: 14px 28px;
        background: #f7fafc;
        border: 2px solid #e2e8f0;
        border-radius: 10px;
        cursor: pointer;
        font-weight: 500;
        color: #4a5568;
      }
      .file-name { color: #48bb78; font-size: 0.9em; font-weight: 500; }
      .preview { margin: 25px 0; min-height: 60px; display: flex; justify-content: center; }
      #imagePreview { max-width: 100%; max-height: 350px; border-radius: 12px; display: none; }
      button[type="submit"] { width: 100%; max-width: 300px; font-size: 16px; }
      button[type="submit"]:disabled { opacity: 0.7; cursor: not-allowed; }
      #status { margin-top: 20px; color: #667eea; font-weight: 500; min-height: 24px; }
      .icon { font-size: 2.5em; margin-bottom: 15px; }
"#;

const INDEX_BODY: &str = r#"
    <div class="container">
      <div class="icon">🧟</div>
      <h2 class="gradient-text">Zombie Face Transformer</h2>
      <p class="subtitle">Upload a clear photo of your face for best results</p>

      <form action="/generate" method="post" enctype="multipart/form-data" id="uploadForm">
        <div class="upload-container">
          <input type="file" name="image" accept="image/*" required id="imageInput" />
          <label for="imageInput" class="file-input-label">📁 Choose Photo</label>
          <div class="file-name" id="fileName"></div>
          <div class="preview"><img id="imagePreview" alt="Preview" /></div>
          <button type="submit" class="button" id="submitBtn">Transform into Zombie</button>
          <p id="status"></p>
        </div>
      </form>
    </div>

    <script>
      const imageInput = document.getElementById('imageInput');
      const imagePreview = document.getElementById('imagePreview');
      const submitBtn = document.getElementById('submitBtn');

      imageInput.addEventListener('change', (e) => {
        const file = e.target.files[0];
        if (!file) return;
        document.getElementById('fileName').textContent = '✓ ' + file.name;
        const reader = new FileReader();
        reader.onload = (ev) => {
          imagePreview.src = ev.target.result;
          imagePreview.style.display = 'block';
        };
        reader.readAsDataURL(file);
      });

      document.getElementById('uploadForm').addEventListener('submit', () => {
        submitBtn.disabled = true;
        submitBtn.textContent = '⏳ Transforming...';
        document.getElementById('status').textContent = 'This may take 30-60 seconds...';
      });
    </script>
"#;

const RESULT_STYLE: &str = r#"
      .container { max-width: 800px; margin: 0 auto; }
      h3 { font-size: 1.8em; font-weight: 700; margin-bottom: 30px; }
      .image-wrapper {
        background: #ffffff;
        border-radius: 16px;
        padding: 20px;
        box-shadow: 0 10px 30px rgba(0, 0, 0, 0.1);
        margin-bottom: 30px;
      }
      img { max-width: 100%; border-radius: 12px; }
      .button-group { display: flex; gap: 15px; justify-content: center; flex-wrap: wrap; }
      .download { background: linear-gradient(135deg, #48bb78 0%, #38a169 100%); }
"#;

const ERROR_STYLE: &str = r#"
      .container { max-width: 600px; margin: 50px auto; }
      h3 { font-size: 1.8em; font-weight: 700; color: #e53e3e; margin-bottom: 20px; }
      .error-box {
        background: #fff5f5;
        border: 2px solid #feb2b2;
        border-radius: 12px;
        padding: 25px;
        margin: 20px 0 25px;
      }
      .error-message { color: #c53030; font-weight: 500; margin-bottom: 15px; }
      .tips { color: #718096; line-height: 1.8; }
"#;

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap" rel="stylesheet">
    <style>{base}{style}
    </style>
  </head>
  <body>{body}
  </body>
</html>
"#,
        title = escape_html(title),
        base = BASE_STYLE,
        style = style,
        body = body,
    )
}

pub fn index_page() -> String {
    document("Zombie Face Transformer", INDEX_STYLE, INDEX_BODY)
}

/// `image_src` is either a remote URL or a `data:` URL.
pub fn result_page(image_src: &str) -> String {
    let src = escape_html(image_src);
    let body = format!(
        r#"
    <div class="container">
      <h3 class="gradient-text">🧟 Your Zombie Transformation!</h3>
      <div class="image-wrapper">
        <img src="{src}" alt="Zombie Version" />
      </div>
      <div class="button-group">
        <a href="{src}" download="{download}" class="button download">⬇ Download Image</a>
        <a href="/" class="button create-another">🔄 Create Another</a>
      </div>
    </div>"#,
        src = src,
        download = DOWNLOAD_FILE_NAME,
    );
    document("Your Zombie Transformation", RESULT_STYLE, &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"
    <div class="container">
      <h3>⚠️ Transformation Failed</h3>
      <div class="error-box">
        <div class="error-message">Error: {message}</div>
        <div class="tips">
          <strong>Tips:</strong><br>
          • Make sure your image shows a clear face<br>
          • Image must be under 10MB<br>
          • Supported formats: JPG, PNG, WEBP
        </div>
      </div>
      <a href="/" class="button">← Try Again</a>
    </div>"#,
        message = escape_html(message),
    );
    document("Error", ERROR_STYLE, &body)
}
