//! The single-page courtroom frontend served at `/`.
//!
//! Everything is inline so the binary stays self-contained. Sprites are
//! rendered as colored placeholders keyed by the sprite name the API
//! returns; a real asset pack can replace them without touching the server.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Worry Butler — Courtroom</title>
<style>
  body { font-family: Georgia, serif; background: #1a1423; color: #eee;
         max-width: 760px; margin: 2rem auto; padding: 0 1rem; }
  h1 { text-align: center; letter-spacing: 0.1em; }
  form { display: flex; gap: 0.5rem; margin: 1.5rem 0; }
  input[type=text] { flex: 1; padding: 0.7rem; font-size: 1rem;
         background: #2b2136; color: #eee; border: 1px solid #554; }
  button { padding: 0.7rem 1.4rem; font-size: 1rem; cursor: pointer;
         background: #8b1e3f; color: #fff; border: none; }
  button:disabled { opacity: 0.5; cursor: wait; }
  .line { display: flex; gap: 1rem; margin: 1rem 0; padding: 1rem;
         background: #241b30; border-left: 4px solid #555; }
  .line.left { border-color: #c0392b; }
  .line.right { border-color: #2980b9; }
  .line.center { border-color: #b8860b; }
  .line.courtroom-left { background: #2e1a20; }
  .line.courtroom-right { background: #1a2030; }
  .line.courtroom-judge { background: #2a2418; }
  .sprite { width: 64px; height: 64px; flex: none; border-radius: 8px;
         display: flex; align-items: center; justify-content: center;
         font-size: 0.6rem; text-align: center; color: #fff; }
  .speaker { font-weight: bold; margin-bottom: 0.3rem; }
  .emotion { font-size: 0.8rem; opacity: 0.6; font-style: italic; }
  #status { text-align: center; opacity: 0.7; min-height: 1.2em; }
  #meta { text-align: center; font-size: 0.8rem; opacity: 0.5; }
</style>
</head>
<body>
<h1>⚖ WORRY BUTLER ⚖</h1>
<form id="form">
  <input type="text" id="worry" placeholder="State your worry for the court..." required>
  <button type="submit" id="go">Take it to court</button>
</form>
<p id="status"></p>
<div id="scene"></div>
<p id="meta"></p>
<script>
const COLORS = { prosecutor: "#c0392b", defense: "#2980b9", judge: "#b8860b" };

document.getElementById("form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const worry = document.getElementById("worry").value.trim();
  if (!worry) return;
  const go = document.getElementById("go");
  const status = document.getElementById("status");
  const scene = document.getElementById("scene");
  const meta = document.getElementById("meta");
  go.disabled = true;
  scene.innerHTML = "";
  meta.textContent = "";
  status.textContent = "Court is in session...";
  try {
    const resp = await fetch("/process-worry", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ worry }),
    });
    const data = await resp.json();
    if (!resp.ok) throw new Error(data.error || ("HTTP " + resp.status));
    status.textContent = "";
    for (const line of data.dialogue) {
      const div = document.createElement("div");
      div.className = "line " + line.position + " " + line.background;
      const sprite = document.createElement("div");
      sprite.className = "sprite";
      sprite.style.background = COLORS[line.character] || "#555";
      sprite.textContent = line.sprite;
      const body = document.createElement("div");
      const speaker = document.createElement("div");
      speaker.className = "speaker";
      speaker.textContent = line.name + " ";
      const emotion = document.createElement("span");
      emotion.className = "emotion";
      emotion.textContent = "(" + line.emotion + ")";
      speaker.appendChild(emotion);
      const text = document.createElement("div");
      text.textContent = line.text;
      body.appendChild(speaker);
      body.appendChild(text);
      div.appendChild(sprite);
      div.appendChild(body);
      scene.appendChild(div);
    }
    const m = data.metadata;
    meta.textContent = m.mode + " mode, " + m.model + ", " +
      (m.elapsed_ms / 1000).toFixed(1) + "s";
  } catch (err) {
    status.textContent = "Objection! " + err.message;
  } finally {
    go.disabled = false;
  }
});
</script>
</body>
</html>
"##;
