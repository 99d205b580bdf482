//! 可编辑文档构建器
//!
//! 把重写后的页面装配成一份完整的可编辑 HTML 文档：固定工具栏、
//! 内容容器、编辑提示气泡，以及一段行为脚本。行为脚本在文档自身
//! 加载完成后按 [`EditorSchedule`] 的时间线执行：先中和脚本和
//! iframe，再把正文里的文本元素标记为可就地编辑。

use chrono::{SecondsFormat, Utc};

use crate::core::{CaptureError, CaptureMode};
use crate::parsers::html::RewrittenDocument;

use super::schedule::EditorSchedule;

/// 编辑器自身的样式，随文档内联输出
const EDITOR_STYLES: &str = r##"<style>
/* Editor toolbar */
.page-editor-toolbar {
  position: fixed;
  top: 0;
  left: 0;
  right: 0;
  background-color: #4a90e2;
  color: white;
  display: flex;
  justify-content: space-between;
  align-items: center;
  padding: 10px 20px;
  z-index: 9999;
  box-shadow: 0 2px 5px rgba(0, 0, 0, 0.2);
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
}

.page-editor-toolbar-title {
  font-weight: bold;
  font-size: 16px;
}

.page-editor-toolbar-buttons {
  display: flex;
  gap: 10px;
}

.page-editor-toolbar-button {
  background-color: white;
  color: #4a90e2;
  border: none;
  border-radius: 4px;
  padding: 5px 12px;
  font-size: 14px;
  font-weight: 600;
  cursor: pointer;
  transition: background-color 0.2s;
}

.page-editor-toolbar-button:hover {
  background-color: #f0f0f0;
}

.page-editor-toolbar-button:disabled {
  opacity: 0.6;
  cursor: not-allowed;
}

/* Editable content affordances */
[contenteditable="true"] {
  outline: none;
  min-height: 1em;
}

[contenteditable="true"]:hover {
  background-color: rgba(74, 144, 226, 0.1);
  cursor: text;
}

[contenteditable="true"]:focus {
  background-color: rgba(74, 144, 226, 0.15);
  border-radius: 2px;
}

/* Captured page container */
.page-editor-content {
  margin-top: 50px;
  min-height: calc(100vh - 50px);
}

/* Edit tooltip */
.edit-tooltip {
  position: absolute;
  background-color: rgba(0, 0, 0, 0.7);
  color: white;
  padding: 5px 10px;
  border-radius: 4px;
  font-size: 12px;
  pointer-events: none;
  z-index: 9990;
  display: none;
  white-space: nowrap;
}

/* Neutralized iframe placeholder */
.iframe-placeholder {
  border: 1px dashed #ccc;
  padding: 10px;
  margin: 10px 0;
  background-color: #f9f9f9;
  text-align: center;
  color: #666;
}

@media print {
  .page-editor-toolbar,
  .edit-tooltip {
    display: none !important;
  }

  .page-editor-content {
    margin-top: 0 !important;
  }
}
</style>"##;

/// 行为脚本主体；时间线常量由 [`build_behavior_script`] 前置注入
const EDITOR_SCRIPT_BODY: &str = r##"
  let isEditMode = true;

  const saveBtn = document.getElementById('save-btn');
  const printBtn = document.getElementById('print-btn');
  const toggleEditBtn = document.getElementById('toggle-edit-btn');
  const runScriptsBtn = document.getElementById('run-scripts-btn');
  const editTooltip = document.getElementById('edit-tooltip');
  const editorContent = document.querySelector('.page-editor-content');

  document.addEventListener('DOMContentLoaded', initEditor);

  function initEditor() {
    setTimeout(() => {
      neutralizeFramesAndScripts();

      if (extraDelayMs > 0) {
        setTimeout(activateEditing, extraDelayMs);
      } else {
        activateEditing();
      }
    }, settleDelayMs);

    if (saveBtn) saveBtn.addEventListener('click', savePage);
    if (printBtn) printBtn.addEventListener('click', printPage);
    if (toggleEditBtn) toggleEditBtn.addEventListener('click', toggleEditMode);
    if (runScriptsBtn) runScriptsBtn.addEventListener('click', enablePageScripts);
  }

  function activateEditing() {
    makeElementsEditable(editorContent);
    addTooltipFunctionality();
  }

  function neutralizeFramesAndScripts() {
    document.querySelectorAll('script').forEach(script => {
      if (!script.hasAttribute('data-editor-script')) {
        script.type = 'text/disabled';
      }
    });

    document.querySelectorAll('iframe').forEach(iframe => {
      const placeholder = document.createElement('div');
      placeholder.className = 'iframe-placeholder';
      placeholder.innerHTML = '<p>iframe content: ' + (iframe.src || 'empty') + '</p>';

      iframe.parentNode.insertBefore(placeholder, iframe);
      iframe.style.display = 'none';
    });
  }

  function makeElementsEditable(container) {
    const selector = 'p, h1, h2, h3, h4, h5, h6, span, div, a, li, td, th, strong, em, label, button, figcaption';
    const textElements = container.querySelectorAll(selector);

    textElements.forEach(element => {
      if (element.closest('.page-editor-toolbar') ||
          element.closest('.edit-tooltip')) {
        return;
      }

      if (!element.textContent.trim()) {
        return;
      }

      element.setAttribute('contenteditable', 'true');

      if (element.tagName.toLowerCase() === 'a') {
        element.addEventListener('click', function(e) {
          if (isEditMode) {
            e.preventDefault();
          }
        });
      }
    });
  }

  function addTooltipFunctionality() {
    const editableElements = document.querySelectorAll('[contenteditable="true"]');

    editableElements.forEach(element => {
      element.addEventListener('mouseover', function() {
        if (isEditMode) {
          const rect = element.getBoundingClientRect();
          editTooltip.style.top = (window.scrollY + rect.top - 30) + 'px';
          editTooltip.style.left = (rect.left + rect.width / 2 - 50) + 'px';
          editTooltip.style.display = 'block';
        }
      });

      element.addEventListener('mouseout', function() {
        editTooltip.style.display = 'none';
      });

      element.addEventListener('focus', function() {
        editTooltip.style.display = 'none';
      });
    });
  }

  function toggleEditMode() {
    isEditMode = !isEditMode;

    const editableElements = document.querySelectorAll('[contenteditable]');
    editableElements.forEach(element => {
      element.setAttribute('contenteditable', isEditMode.toString());
    });

    toggleEditBtn.textContent = isEditMode ? 'Toggle Edit Mode' : 'Enable Editing';

    if (!isEditMode) {
      editTooltip.style.display = 'none';
    }
  }

  function enablePageScripts() {
    if (confirm('Enabling scripts may cause the page to change or navigate away. Continue?')) {
      document.querySelectorAll('script[type="text/disabled"]').forEach(script => {
        const newScript = document.createElement('script');

        Array.from(script.attributes).forEach(attr => {
          if (attr.name !== 'type') {
            newScript.setAttribute(attr.name, attr.value);
          }
        });

        newScript.textContent = script.textContent;
        script.parentNode.replaceChild(newScript, script);
      });

      document.querySelectorAll('iframe').forEach(iframe => {
        iframe.style.display = '';
        const placeholder = iframe.previousSibling;
        if (placeholder && placeholder.className === 'iframe-placeholder') {
          placeholder.parentNode.removeChild(placeholder);
        }
      });

      toggleEditMode();

      runScriptsBtn.disabled = true;
      runScriptsBtn.textContent = 'Scripts Enabled';
    }
  }

  function savePage() {
    try {
      const docType = document.doctype;
      const docTypeString = docType ?
        '<!DOCTYPE ' + docType.name +
        (docType.publicId ? ' PUBLIC "' + docType.publicId + '"' : '') +
        (docType.systemId ? ' "' + docType.systemId + '"' : '') + '>' :
        '<!DOCTYPE html>';

      const editableElements = document.querySelectorAll('[contenteditable="true"]');
      editableElements.forEach(element => {
        element.removeAttribute('contenteditable');
      });

      const toolbar = document.querySelector('.page-editor-toolbar');
      const tooltip = document.getElementById('edit-tooltip');
      const toolbarDisplay = toolbar.style.display;
      const tooltipDisplay = tooltip.style.display;

      toolbar.style.display = 'none';
      tooltip.style.display = 'none';

      const htmlContent = docTypeString + '\n' + document.documentElement.outerHTML;

      editableElements.forEach(element => {
        element.setAttribute('contenteditable', 'true');
      });
      toolbar.style.display = toolbarDisplay;
      tooltip.style.display = tooltipDisplay;

      const blob = new Blob([htmlContent], { type: 'text/html' });
      const filename = prompt('Enter filename to save as:', 'edited-page.html');

      if (filename) {
        const url = URL.createObjectURL(blob);
        const a = document.createElement('a');
        a.href = url;
        a.download = filename;
        a.style.display = 'none';
        document.body.appendChild(a);
        a.click();
        document.body.removeChild(a);
        URL.revokeObjectURL(url);
      }
    } catch (error) {
      console.error('Error saving page:', error);
      alert('Failed to save the page: ' + error.message);
    }
  }

  function printPage() {
    const toolbar = document.querySelector('.page-editor-toolbar');
    const tooltip = document.getElementById('edit-tooltip');
    const editableElements = document.querySelectorAll('[contenteditable="true"]');

    const toolbarDisplay = toolbar.style.display;
    const tooltipDisplay = tooltip.style.display;

    toolbar.style.display = 'none';
    tooltip.style.display = 'none';
    editableElements.forEach(element => {
      element.removeAttribute('contenteditable');
    });

    window.print();

    toolbar.style.display = toolbarDisplay;
    tooltip.style.display = tooltipDisplay;
    editableElements.forEach(element => {
      if (isEditMode) {
        element.setAttribute('contenteditable', 'true');
      }
    });
  }
"##;

/// 可编辑文档构建器
///
/// 消费一份 [`RewrittenDocument`]，产出完整的 HTML 文档字符串。
/// 输出以重建的 doctype 行开头，可直接写入显示面或存盘。
pub struct EditorBuilder;

impl EditorBuilder {
    pub fn new() -> Self {
        EditorBuilder
    }

    /// 装配完整的编辑器文档
    ///
    /// `Run Scripts` 按钮只在动态捕获时出现。`wait_seconds` 只影响
    /// 动态捕获的编辑激活时间线，检索行为不受它影响。
    pub fn build(
        &self,
        source_url: &str,
        document: RewrittenDocument,
        mode: CaptureMode,
        wait_seconds: u64,
    ) -> Result<String, CaptureError> {
        if source_url.trim().is_empty() {
            return Err(CaptureError::EditorBuild(
                "source URL is empty".to_string(),
            ));
        }

        let schedule = EditorSchedule::new(mode, wait_seconds);
        let run_scripts_button = if mode == CaptureMode::Dynamic {
            "\n      <button id=\"run-scripts-btn\" class=\"page-editor-toolbar-button\">Run Scripts</button>"
        } else {
            ""
        };

        Ok(format!(
            r#"{doctype}
{metadata}
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Edit: {source_url}</title>
  {head_markup}
  {styles}
</head>
<body>
  <div class="page-editor-toolbar">
    <div class="page-editor-toolbar-title">
      Editing copy of: {source_url}
    </div>
    <div class="page-editor-toolbar-buttons">
      <button id="save-btn" class="page-editor-toolbar-button">Save</button>
      <button id="print-btn" class="page-editor-toolbar-button">Print</button>
      <button id="toggle-edit-btn" class="page-editor-toolbar-button">Toggle Edit Mode</button>{run_scripts_button}
    </div>
  </div>

  <div class="page-editor-content">
    {body_markup}
  </div>

  <div id="edit-tooltip" class="edit-tooltip">Click to edit</div>

  {script}
</body>
</html>"#,
            doctype = document.doctype,
            metadata = metadata_comment(source_url),
            source_url = source_url,
            head_markup = document.head_markup,
            styles = EDITOR_STYLES,
            run_scripts_button = run_scripts_button,
            body_markup = document.body_markup,
            script = build_behavior_script(&schedule),
        ))
    }
}

/// 生成行为脚本：把时间线常量前置到脚本主体
fn build_behavior_script(schedule: &EditorSchedule) -> String {
    let timeline = format!(
        "  const settleDelayMs = {};\n  const extraDelayMs = {};\n",
        schedule.settle_delay().as_millis(),
        schedule.extra_delay().as_millis(),
    );

    [
        "<script data-editor-script=\"true\">\n(function() {\n  'use strict';\n",
        timeline.as_str(),
        EDITOR_SCRIPT_BODY,
        "})();\n</script>",
    ]
    .concat()
}

/// 捕获来源与时间的注释，紧随 doctype 行
fn metadata_comment(source_url: &str) -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "<!-- Captured from {} at {} using pagedit v{} -->",
        source_url,
        timestamp,
        env!("CARGO_PKG_VERSION")
    )
}
