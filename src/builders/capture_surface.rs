//! 交互捕获面
//!
//! 交互模式不经过代理：构建一个次级页面，内嵌指向目标 URL 的
//! live iframe，用户在页面加载完成后手动（或延时）触发捕获。
//! 捕获脚本直接读取 iframe 的文档；跨源访问抛出异常时在页面内
//! 给出明确提示，不做自动重试。
//!
//! 捕获结果通过 `postMessage` 交还给打开该页面的宿主窗口，由宿主
//! 继续走重写与构建流程。

/// 捕获面样式
const SURFACE_STYLES: &str = r##"<style>
  body, html { margin: 0; padding: 0; height: 100%; font-family: Arial, sans-serif; }
  .toolbar { position: fixed; top: 0; left: 0; right: 0; background: #4a90e2; color: white; padding: 10px 20px; z-index: 9999; display: flex; justify-content: space-between; align-items: center; }
  .toolbar-title { font-weight: bold; font-size: 16px; }
  .toolbar-info { font-size: 14px; }
  .toolbar-buttons { display: flex; gap: 10px; }
  .btn { background: white; color: #4a90e2; border: none; border-radius: 4px; padding: 5px 12px; font-size: 14px; font-weight: 600; cursor: pointer; }
  .btn:hover { background: #f0f0f0; }
  .btn:disabled { opacity: 0.6; cursor: not-allowed; }
  iframe { width: 100%; height: calc(100vh - 50px); border: none; margin-top: 50px; }
  .loading { position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%); background: rgba(0,0,0,0.7); color: white; padding: 20px; border-radius: 8px; text-align: center; z-index: 9998; }
  .error { position: fixed; top: 60px; left: 20px; right: 20px; background: #ff4444; color: white; padding: 15px; border-radius: 5px; z-index: 9997; display: none; }
  .success { position: fixed; top: 60px; right: 20px; background: #4CAF50; color: white; padding: 15px; border-radius: 5px; z-index: 9997; display: none; }
</style>"##;

/// 捕获脚本主体；目标 URL 与等待秒数由前置常量注入
const CAPTURE_SCRIPT_BODY: &str = r##"
  const iframe = document.getElementById('capture-iframe');
  const captureBtn = document.getElementById('capture-btn');
  const waitBtn = document.getElementById('wait-btn');
  const loadingMessage = document.getElementById('loading-message');
  const errorMessage = document.getElementById('error-msg');
  const successMessage = document.getElementById('success-msg');

  function showError(message) {
    errorMessage.textContent = message;
    errorMessage.style.display = 'block';
    setTimeout(() => { errorMessage.style.display = 'none'; }, 5000);
  }

  function showSuccess(message) {
    successMessage.textContent = message;
    successMessage.style.display = 'block';
    setTimeout(() => { successMessage.style.display = 'none'; }, 3000);
  }

  iframe.addEventListener('load', () => {
    loadingMessage.style.display = 'none';
  });

  iframe.addEventListener('error', () => {
    loadingMessage.style.display = 'none';
    showError('Failed to load the webpage. Please check the URL and try again.');
  });

  captureBtn.addEventListener('click', () => {
    capturePageContent();
  });

  waitBtn.addEventListener('click', () => {
    waitBtn.disabled = true;
    waitBtn.textContent = 'Waiting (' + waitTime + 's)...';
    setTimeout(() => {
      capturePageContent();
      waitBtn.disabled = false;
      waitBtn.textContent = 'Wait + Capture';
    }, waitTime * 1000);
  });

  function capturePageContent() {
    try {
      const iframeDoc = iframe.contentDocument || iframe.contentWindow.document;

      if (!iframeDoc) {
        throw new Error('Cannot access iframe content due to cross-origin restrictions.');
      }

      const doctype = getDocTypeString(iframeDoc);
      const htmlContent = doctype + '\n' + iframeDoc.documentElement.outerHTML;

      deliverCapture(htmlContent);

    } catch (error) {
      if (error.message.includes('cross-origin') || error.message.includes('Blocked a frame')) {
        showError('Cross-origin restriction detected! This site cannot be captured in interactive mode. Please try static or dynamic capture instead.');
      } else {
        showError('Error capturing page: ' + error.message);
      }
      console.error('Capture error:', error);
    }
  }

  function getDocTypeString(doc) {
    const doctype = doc.doctype;
    return doctype ?
      '<!DOCTYPE ' + doctype.name +
      (doctype.publicId ? ' PUBLIC "' + doctype.publicId + '"' : '') +
      (doctype.systemId ? ' "' + doctype.systemId + '"' : '') + '>' :
      '<!DOCTYPE html>';
  }

  function deliverCapture(htmlContent) {
    if (!window.opener) {
      showError('No host window to deliver the capture to.');
      return;
    }
    window.opener.postMessage({ kind: 'frame-capture', url: targetUrl, html: htmlContent }, '*');
    showSuccess('Editable copy captured successfully!');
  }
"##;

/// 构建交互捕获面的完整 HTML 文档
pub fn build_capture_surface(url: &str, wait_seconds: u64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Capturing: {url}</title>
  {styles}
</head>
<body>
  <div class="toolbar">
    <div>
      <div class="toolbar-title">Capturing: {url}</div>
      <div class="toolbar-info">Wait for the page to load, then click "Capture Now"</div>
    </div>
    <div class="toolbar-buttons">
      <button class="btn" id="capture-btn">Capture Now</button>
      <button class="btn" id="wait-btn">Wait + Capture</button>
    </div>
  </div>
  <div class="loading" id="loading-message"><div>Loading page, please wait...</div></div>
  <div class="error" id="error-msg"></div>
  <div class="success" id="success-msg"></div>
  <iframe src="{url}" id="capture-iframe"></iframe>
  {script}
</body>
</html>"#,
        url = url,
        styles = SURFACE_STYLES,
        script = build_capture_script(url, wait_seconds),
    )
}

/// 生成捕获脚本：注入目标 URL 与等待秒数
fn build_capture_script(url: &str, wait_seconds: u64) -> String {
    let prelude = format!(
        "  const targetUrl = '{}';\n  const waitTime = {};\n",
        url.replace('\'', "\\'"),
        wait_seconds
    );

    ["<script>\n", prelude.as_str(), CAPTURE_SCRIPT_BODY, "</script>"].concat()
}
