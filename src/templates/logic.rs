//! Python emitted into the block zone of a scene.
//!
//! The generated code reads its block from `EXCHANGE_DATA` when the scene is
//! rendered and re-checks the values it uses, so a hand-edited exchange file
//! degrades the same way a bad setup does here.

use crate::setup::AnimationSetup;
use log::warn;

/// Logic for one block, one entry per line, without indentation
pub fn block_logic(block_id: &str, setup: Option<&AnimationSetup>) -> Vec<String> {
    let id = py_str(block_id);

    let Some(setup) = setup else {
        warn!("No setup for block {}, scene will be empty", block_id);
        return vec![
            format!(
                "print(\"[eqanim] warning: no setup for block \" + {} + \", nothing to animate\")",
                id
            ),
            "pass".to_string(),
        ];
    };

    let replaced = setup.fallbacks();
    if !replaced.is_empty() {
        warn!("Block {} falls back to defaults for: {}", block_id, replaced.join(", "));
    }

    let mut py = vec![
        format!("block_id = {}", id),
        "setup = EXCHANGE_DATA.get(\"setups\", {}).get(block_id)".to_string(),
        "lines = EXCHANGE_DATA.get(\"blocks\", {}).get(block_id)".to_string(),
        "if setup is None or not lines:".to_string(),
        "    print(f\"[eqanim] warning: {block_id} not found in exchange data, nothing to animate\")"
            .to_string(),
        "else:".to_string(),
    ];

    let body = [
        "def number(key, default, positive=False):",
        "    value = setup.get(key)",
        "    if value is None:",
        "        return default",
        "    if (isinstance(value, bool) or not isinstance(value, (int, float))",
        "            or value != value or value < 0 or (positive and value == 0)):",
        "        print(f\"[eqanim] warning: invalid {key} {value!r} for {block_id}, using {default}\")",
        "        return default",
        "    return value",
        // Presentation object
        "position = setup.get(\"position\")",
        "if position is None:",
        "    position = [0, 0, 0]",
        "elif not (isinstance(position, (list, tuple)) and len(position) == 3",
        "          and all(isinstance(v, (int, float)) for v in position)):",
        "    print(f\"[eqanim] warning: invalid position {position!r} for {block_id}, using origin\")",
        "    position = [0, 0, 0]",
        "color = setup.get(\"color\", \"#FFFFFF\")",
        "equation = VGroup(*[MathTex(line, color=color) for line in lines]).arrange(DOWN)",
        "equation.scale(number(\"scale\", 1.0, positive=True))",
        "equation.move_to(np.array(position, dtype=float))",
        // Timeline
        "self.wait(number(\"delay_before_seconds\", 0.5))",
        "animation_name = setup.get(\"animation_type\", \"Write\")",
        "animation = ANIMATIONS.get(animation_name)",
        "if animation is None:",
        "    print(f\"[eqanim] warning: animation {animation_name!r} not available, using Write\")",
        "    animation = Write",
        "self.play(animation(equation), run_time=number(\"duration_seconds\", 1.5 * len(lines), positive=True))",
        "self.wait(number(\"delay_after_seconds\", 1.0))",
        "if not setup.get(\"keep_visible_after\", True):",
        "    self.play(FadeOut(equation))",
    ];
    py.extend(body.iter().map(|line| format!("    {}", line)));
    py
}

/// Quote `s` as a Python string literal
fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
