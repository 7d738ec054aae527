// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持西班牙语（默认）、英文、中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 语言环境变量
pub const LOCALE_ENV: &str = "CONTROL_TOWER_LOCALE";

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"es"、"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 按环境变量设置语言 (未设置时保持默认)
pub fn init_from_env() {
    if let Ok(locale) = std::env::var(LOCALE_ENV) {
        let locale = locale.trim();
        if !locale.is_empty() {
            set_locale(locale);
        }
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use textile_control_tower::i18n::t;
/// let label = t("workflow.advance.transit");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use textile_control_tower::i18n::t_with_args;
/// let msg = t_with_args("activity.status_advanced", &[("from", "TRANSIT"), ("to", "PORT")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 为避免测试互相干扰，这里对 i18n 相关测试串行化。
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale("es");
        assert_eq!(current_locale(), "es");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("es");
        assert_eq!(t("workflow.advance.customs"), "✅ Liberar");
        assert_eq!(t("export.headers.container_id"), "ID Contenedor");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("es");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("es");
        let msg = t_with_args("activity.status_advanced", &[("from", "TRANSIT"), ("to", "PORT")]);
        assert_eq!(msg, "Estatus actualizado: TRANSIT → PORT");

        set_locale("zh-CN");
        let msg = t_with_args(
            "alerts.duplicate_container",
            &[("container_number", "HLBU-1234567"), ("status", "PORT"), ("supplier", "DenimWorld")],
        );
        assert!(msg.contains("HLBU-1234567"));
        assert!(msg.contains("已存在"));

        set_locale("es");
    }
}
