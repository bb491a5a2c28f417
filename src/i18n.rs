// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 可用语言列表
pub fn available_locales() -> Vec<String> {
    rust_i18n::available_locales!()
        .into_iter()
        .map(|l| l.to_string())
        .collect()
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use feedback_dashboard::i18n::t;
/// let msg = t("upload.successful");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use feedback_dashboard::i18n::t_with_args;
/// let msg = t_with_args("import.unknown_column", &[("label", "Province")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不修改全局语言）
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

/// 单复数消息: 取 `<key>.one` 或 `<key>.other`，并填充 %{count}
pub fn t_plural(key: &str, count: usize) -> String {
    let form = if count == 1 { "one" } else { "other" };
    let count_text = count.to_string();
    t_with_args(&format!("{}.{}", key, form), &[("count", &count_text)])
}

fn fill_args(template: String, args: &[(&str, &str)]) -> String {
    // 单遍替换: 已填入的参数值不再参与匹配
    let mut result = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(start) = rest.find("%{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };

        let name = &after[..end];
        match args.iter().find(|(k, _)| *k == name) {
            Some((_, v)) => result.push_str(v),
            None => result.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}
