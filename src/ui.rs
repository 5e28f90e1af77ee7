use crate::engine::CalculationMethod;
use crate::models::DashboardResponse;

pub fn render_index(snapshot: &DashboardResponse) -> String {
    let location = snapshot
        .location
        .label
        .clone()
        .unwrap_or_else(|| format!("{:.4}, {:.4}", snapshot.location.lat, snapshot.location.lon));
    let (next_name, countdown) = snapshot
        .next_prayer
        .as_ref()
        .map(|next| (next.name.to_string(), next.countdown.clone()))
        .unwrap_or_else(|| ("Loading...".to_string(), "--:--:--".to_string()));
    let hijri = if snapshot.hijri.is_empty() {
        "..."
    } else {
        snapshot.hijri.as_str()
    };

    INDEX_HTML
        .replace("{{LOCATION}}", &escape_html(&location))
        .replace("{{NEXT_NAME}}", &escape_html(&next_name))
        .replace("{{COUNTDOWN}}", &escape_html(&countdown))
        .replace("{{HIJRI}}", &escape_html(hijri))
        .replace("{{DATE}}", &snapshot.date.to_string())
        .replace(
            "{{METHOD_OPTIONS}}",
            &method_options(snapshot.preferences.method),
        )
}

fn method_options(selected: CalculationMethod) -> String {
    CalculationMethod::ALL
        .iter()
        .map(|method| {
            let label = escape_html(method.label());
            let flag = if *method == selected { " selected" } else { "" };
            format!(r#"<option value="{label}"{flag}>{label}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Prayer Times</title>
  <style>
    :root {
      --bg: #0f3d2e;
      --ink: #f5f1e6;
      --muted: rgba(245, 241, 230, 0.65);
      --gold: #d4af37;
      --card: rgba(255, 255, 255, 0.04);
      --line: rgba(212, 175, 55, 0.45);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 24px 14px 48px;
    }

    .app {
      width: min(900px, 100%);
      display: grid;
      gap: 18px;
    }

    header {
      text-align: center;
    }

    h1 {
      margin: 0 0 6px;
      color: var(--gold);
      font-size: clamp(2rem, 6vw, 3.2rem);
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
    }

    .card {
      border: 1px solid var(--line);
      border-radius: 18px;
      padding: 16px;
      background: var(--card);
    }

    .countdown {
      text-align: center;
    }

    .countdown .value {
      font-size: clamp(2rem, 8vw, 3.4rem);
      font-variant-numeric: tabular-nums;
      color: var(--gold);
    }

    .grid {
      display: grid;
      grid-template-columns: 2fr 1fr;
      gap: 16px;
    }

    .times {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 8px;
    }

    .time {
      display: flex;
      justify-content: space-between;
      border: 1px solid rgba(245, 241, 230, 0.2);
      border-radius: 12px;
      padding: 8px 12px;
    }

    .time.next {
      border-color: var(--gold);
    }

    h2, h3 {
      margin: 0 0 10px;
      color: var(--gold);
      font-size: 1rem;
    }

    .event {
      border: 1px solid rgba(212, 175, 55, 0.2);
      border-radius: 10px;
      padding: 6px 10px;
      margin-bottom: 6px;
      font-size: 0.85rem;
    }

    .event.past {
      opacity: 0.45;
    }

    .settings {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 12px;
      align-items: end;
    }

    label {
      display: grid;
      gap: 4px;
      font-size: 0.85rem;
      color: var(--muted);
    }

    input, select, button {
      font: inherit;
      padding: 6px 10px;
      border-radius: 8px;
      border: 1px solid var(--line);
      background: #123f31;
      color: var(--ink);
    }

    button {
      cursor: pointer;
      background: var(--gold);
      color: var(--bg);
      font-weight: 600;
    }

    .status {
      font-size: 0.95rem;
      min-height: 1.2em;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: #ff8a7a;
    }

    .status[data-type="ok"] {
      color: #9be3b4;
    }

    .hint {
      margin: 0;
      color: var(--muted);
      font-size: 0.8rem;
      text-align: center;
    }

    @media (max-width: 700px) {
      .grid {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Prayer Times</h1>
      <p class="subtitle">Daily prayers, Qibla, and Hijri calendar for <span id="location">{{LOCATION}}</span></p>
    </header>

    <section class="card countdown">
      <div class="subtitle">Next prayer: <strong id="next-name">{{NEXT_NAME}}</strong> <span id="next-time"></span></div>
      <div class="value" id="countdown">{{COUNTDOWN}}</div>
    </section>

    <section class="grid">
      <div class="card">
        <h2>Prayer Times (<span id="date-label">{{DATE}}</span>)</h2>
        <div class="times" id="times">Loading...</div>
        <p class="subtitle" id="qibla"></p>
      </div>
      <div class="card">
        <h2>Hijri</h2>
        <div id="hijri">{{HIJRI}}</div>
        <h3 style="margin-top: 14px;">Upcoming Events</h3>
        <div id="upcoming"></div>
        <button type="button" id="calendar-toggle">Calendar</button>
        <div id="calendar" hidden></div>
      </div>
    </section>

    <section class="card settings">
      <label>Search place
        <input id="query" type="search" placeholder="City or address" />
      </label>
      <button type="button" id="search-btn">Search</button>
      <label>Date
        <input id="date" type="date" value="{{DATE}}" />
      </label>
      <label>Method
        <select id="method">{{METHOD_OPTIONS}}</select>
      </label>
      <label>Asr school
        <select id="madhab">
          <option value="Hanafi">Hanafi</option>
          <option value="Shafi">Shafi</option>
        </select>
      </label>
      <label><span><input id="use24h" type="checkbox" /> 24-hour clock</span></label>
      <label><span><input id="reminders" type="checkbox" /> Reminders</span></label>
    </section>

    <div class="status" id="status"></div>
    <p class="hint">Your location is only sent to this server, and to the place-search service when you search.</p>
  </main>

  <script>
    const $ = (id) => document.getElementById(id);
    const statusEl = $('status');
    let snapshot = null;
    let deadline = null;
    let passedFor = null;
    let lastAlert = 0;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, body) => {
      const init = body === undefined
        ? {}
        : { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) };
      const res = await fetch(path, init);
      const data = await res.json().catch(() => ({}));
      if (!res.ok) {
        throw new Error(data.error || `Request failed (${res.status})`);
      }
      return data;
    };

    const render = (data) => {
      snapshot = data;
      $('location').textContent = data.location.label || `${data.location.lat.toFixed(4)}, ${data.location.lon.toFixed(4)}`;
      $('date-label').textContent = data.date;
      $('date').value = data.date;
      $('method').value = data.preferences.method;
      $('madhab').value = data.preferences.madhab;
      $('use24h').checked = data.preferences.use_24h;
      $('reminders').checked = data.preferences.reminders;
      $('hijri').textContent = data.hijri || '...';
      $('qibla').textContent = data.qibla === null ? '' : `Qibla: ${data.qibla.toFixed(1)}° from north`;

      const next = data.next_prayer;
      if (data.prayers) {
        $('times').innerHTML = '';
        data.prayers.forEach((p) => {
          const row = document.createElement('div');
          row.className = 'time' + (next && next.time === p.time ? ' next' : '');
          row.innerHTML = '<span></span><strong></strong>';
          row.children[0].textContent = p.name;
          row.children[1].textContent = p.formatted;
          $('times').appendChild(row);
        });
      } else {
        $('times').textContent = 'Loading...';
      }

      $('next-name').textContent = next ? next.name : 'Loading...';
      $('next-time').textContent = next ? `at ${next.formatted}` : '';
      deadline = next ? Date.now() + next.remaining_seconds * 1000 : null;

      $('upcoming').innerHTML = '';
      data.upcoming_events.forEach((e) => {
        const el = document.createElement('div');
        el.className = 'event';
        el.textContent = `${e.name} · ${e.hijri_date} · ${e.days_until} days away`;
        $('upcoming').appendChild(el);
      });

      if (data.reminders.state === 'forced_off') {
        setStatus('Notification permission denied; reminders turned off.', 'error');
      } else if (data.reminders.state === 'unsupported' && data.preferences.reminders) {
        setStatus('Notifications are not available here.', 'error');
      }
    };

    const refresh = () => api('/api/dashboard').then(render).catch((err) => setStatus(err.message, 'error'));

    const tick = () => {
      if (deadline === null) {
        $('countdown').textContent = '--:--:--';
        return;
      }
      const secs = Math.max(0, Math.round((deadline - Date.now()) / 1000));
      const pad = (n) => String(n).padStart(2, '0');
      $('countdown').textContent = `${pad(Math.floor(secs / 3600))}:${pad(Math.floor((secs % 3600) / 60))}:${pad(secs % 60)}`;
      if (secs === 0 && snapshot && passedFor !== snapshot.next_prayer.time) {
        passedFor = snapshot.next_prayer.time;
        api('/api/prayer-passed', {}).then(render).catch(() => {});
      }
    };

    const chime = (tone) => {
      try {
        const Ctx = window.AudioContext || window.webkitAudioContext;
        const ctx = new Ctx();
        const osc = ctx.createOscillator();
        const gain = ctx.createGain();
        osc.type = 'sine';
        osc.frequency.value = tone.frequency_hz;
        gain.gain.value = tone.gain;
        osc.connect(gain);
        gain.connect(ctx.destination);
        osc.start();
        setTimeout(() => { osc.stop(); ctx.close(); }, tone.duration_ms);
      } catch (_) {}
    };

    const pollAlerts = () => api(`/api/alerts?since=${lastAlert}`).then((alerts) => {
      alerts.forEach((alert) => {
        lastAlert = Math.max(lastAlert, alert.id);
        if ('Notification' in window && Notification.permission === 'granted') {
          new Notification(alert.title, { body: alert.body });
        } else {
          setStatus(alert.body, 'ok');
        }
        if (alert.tone) {
          chime(alert.tone);
        }
      });
    }).catch(() => {});

    const settings = (body) => api('/api/settings', body).then(render).catch((err) => setStatus(err.message, 'error'));

    $('method').addEventListener('change', (e) => settings({ method: e.target.value }));
    $('madhab').addEventListener('change', (e) => settings({ madhab: e.target.value }));
    $('date').addEventListener('change', (e) => e.target.value && settings({ date: e.target.value }));
    $('use24h').addEventListener('change', (e) => settings({ use_24h: e.target.checked }));
    $('reminders').addEventListener('change', async (e) => {
      const on = e.target.checked;
      if (on && 'Notification' in window && Notification.permission === 'default') {
        await Notification.requestPermission().catch(() => {});
      }
      settings({ reminders: on });
    });

    $('search-btn').addEventListener('click', () => {
      const query = $('query').value.trim();
      if (!query) {
        return;
      }
      setStatus('Searching...', '');
      api('/api/location/search', { query })
        .then((data) => { render(data); setStatus('Location updated.', 'ok'); })
        .catch((err) => setStatus(err.message, 'error'));
    });

    $('calendar-toggle').addEventListener('click', async () => {
      const el = $('calendar');
      el.hidden = !el.hidden;
      $('calendar-toggle').textContent = el.hidden ? 'Calendar' : 'Hide';
      if (el.hidden) {
        return;
      }
      const data = await api('/api/calendar').catch(() => ({ events: [] }));
      el.innerHTML = '';
      data.events.forEach((e) => {
        const row = document.createElement('div');
        row.className = 'event' + (e.is_past ? ' past' : '');
        row.textContent = `${e.name} · ${e.hijri_date} · ${e.date}`;
        el.appendChild(row);
      });
    });

    const tz = Intl.DateTimeFormat().resolvedOptions().timeZone || 'UTC';
    const sendLocation = (body) => api('/api/location', body).then(render).catch(refresh);
    if (navigator.geolocation) {
      navigator.geolocation.getCurrentPosition(
        (pos) => sendLocation({ lat: pos.coords.latitude, lon: pos.coords.longitude, tz }),
        () => sendLocation({ tz }),
        { enableHighAccuracy: true, timeout: 10000 }
      );
    } else {
      sendLocation({ tz });
    }

    refresh();
    setInterval(tick, 1000);
    setInterval(refresh, 60000);
    setInterval(pollAlerts, 15000);
  </script>
</body>
</html>
"#;
