/// 渲染器支持的最大模式编号
pub const MAX_MODE: u32 = 8;

const MODE_NAMES: [&str; 9] = [
    "combo",
    "triangle",
    "rect",
    "ellipse",
    "circle",
    "rotatedrect",
    "beziers",
    "rotatedellipse",
    "polygon",
];

/// 模式编号对应的图形名称（仅用于日志）
pub fn mode_name(mode: u32) -> &'static str {
    MODE_NAMES.get(mode as usize).copied().unwrap_or("unknown")
}
