//! Dart source fragments for the generated controller screen.
//!
//! Placeholders are written `__NAME__` and substituted by the generator.

pub(crate) const MAIN_DART: &str = r#"import 'dart:async';
import 'dart:convert';
import 'dart:io';

import 'package:flutter/material.dart';
import 'package:flutter_blue_plus/flutter_blue_plus.dart';
import 'package:permission_handler/permission_handler.dart';
__EXTRA_IMPORTS__
void main() => runApp(const ForgeApp());

class ForgeApp extends StatelessWidget {
  const ForgeApp({super.key});

  @override
  Widget build(BuildContext context) {
    return MaterialApp(
      title: '__APP_TITLE__',
      theme: ThemeData(colorSchemeSeed: Colors.indigo, useMaterial3: true),
      home: const BluetoothScreen(),
      debugShowCheckedModeBanner: false,
    );
  }
}

class BluetoothScreen extends StatefulWidget {
  const BluetoothScreen({super.key});

  @override
  State<BluetoothScreen> createState() => _BluetoothScreenState();
}

class _BluetoothScreenState extends State<BluetoothScreen> {
  List<ScanResult> scanResults = [];
  BluetoothDevice? connectedDevice;
  BluetoothCharacteristic? writeCharacteristic;
  bool isScanning = false;
  bool isConnecting = false;
  String connectionStatus = "Ready to scan";
  bool permissionsGranted = false;
  int dataPackets = 0;
  String deviceId = "Unknown";
  final Map<String, String> sensorValues = {};
  final Map<String, double> sliderValues = {};
  Color selectedColor = Colors.white;
  StreamSubscription<List<ScanResult>>? scanSubscription;
  StreamSubscription<List<int>>? notifySubscription;

  @override
  void initState() {
    super.initState();
    WidgetsBinding.instance.addPostFrameCallback((_) {
      requestPermissions();
    });
  }

  @override
  void dispose() {
    scanSubscription?.cancel();
    notifySubscription?.cancel();
    connectedDevice?.disconnect();
    super.dispose();
  }

  Future<void> requestPermissions() async {
    if (!Platform.isAndroid) {
      setState(() => permissionsGranted = true);
      return;
    }
    final statuses = await [
      Permission.bluetoothScan,
      Permission.bluetoothConnect,
      Permission.location,
    ].request();
    if (!mounted) return;
    setState(() {
      permissionsGranted = statuses.values.every((status) => status.isGranted);
      connectionStatus = permissionsGranted ? "Ready to scan" : "Bluetooth permissions denied";
    });
  }

  Future<void> startScan() async {
    if (!permissionsGranted) {
      await requestPermissions();
      if (!permissionsGranted) return;
    }
    setState(() {
      scanResults = [];
      isScanning = true;
      connectionStatus = "Scanning...";
    });
    await scanSubscription?.cancel();
    scanSubscription = FlutterBluePlus.scanResults.listen((results) {
      if (mounted) setState(() => scanResults = results);
    });
    await FlutterBluePlus.startScan(timeout: const Duration(seconds: 6));
    await FlutterBluePlus.isScanning.where((scanning) => !scanning).first;
    if (!mounted) return;
    setState(() {
      isScanning = false;
      connectionStatus = "Found ${scanResults.length} device(s)";
    });
  }

  Future<void> connect(BluetoothDevice device) async {
    setState(() {
      isConnecting = true;
      connectionStatus = "Connecting...";
    });
    try {
      await device.connect(timeout: const Duration(seconds: 10));
      final services = await device.discoverServices();
      for (final service in services) {
        for (final characteristic in service.characteristics) {
          final props = characteristic.properties;
          if (writeCharacteristic == null && (props.write || props.writeWithoutResponse)) {
            writeCharacteristic = characteristic;
          }
          if (props.notify) {
            await characteristic.setNotifyValue(true);
            await notifySubscription?.cancel();
            notifySubscription = characteristic.onValueReceived.listen(onData);
          }
        }
      }
      setState(() {
        connectedDevice = device;
        deviceId = device.remoteId.str;
        connectionStatus = "Connected to ${displayName(device)}";
      });
    } catch (e) {
      setState(() => connectionStatus = "Connection failed: $e");
    } finally {
      if (mounted) setState(() => isConnecting = false);
    }
  }

  Future<void> disconnect() async {
    await notifySubscription?.cancel();
    await connectedDevice?.disconnect();
    setState(() {
      connectedDevice = null;
      writeCharacteristic = null;
      connectionStatus = "Disconnected";
    });
  }

  String displayName(BluetoothDevice device) {
    return device.platformName.isEmpty ? device.remoteId.str : device.platformName;
  }

  void onData(List<int> value) {
    final text = utf8.decode(value, allowMalformed: true).trim();
    final separator = text.indexOf(':');
    setState(() {
      dataPackets++;
      if (separator > 0) {
        final key = text.substring(0, separator).trim().toUpperCase();
        sensorValues[key] = text.substring(separator + 1).trim();
      }
    });
  }

  Future<void> sendCommand(String command) async {
    final characteristic = writeCharacteristic;
    if (characteristic == null) {
      ScaffoldMessenger.of(context).showSnackBar(
        const SnackBar(content: Text("Connect to a device first")),
      );
      return;
    }
    try {
      await characteristic.write(
        utf8.encode(command),
        withoutResponse: characteristic.properties.writeWithoutResponse,
      );
      setState(() => dataPackets++);
    } catch (e) {
      setState(() => connectionStatus = "Send failed: $e");
    }
  }

  Widget statusCard() {
    final connected = connectedDevice != null;
    return Card(
      child: ListTile(
        leading: Icon(connected ? Icons.bluetooth_connected : Icons.bluetooth),
        title: Text(connectionStatus),
        subtitle: Text("Device: $deviceId | Packets: $dataPackets"),
        trailing: connected
            ? IconButton(icon: const Icon(Icons.link_off), onPressed: disconnect)
            : null,
      ),
    );
  }

  Widget deviceList() {
    if (scanResults.isEmpty) {
      return const Padding(
        padding: EdgeInsets.all(16),
        child: Text("No devices found yet"),
      );
    }
    return Column(
      children: scanResults.map((result) {
        return ListTile(
          leading: const Icon(Icons.devices),
          title: Text(displayName(result.device)),
          subtitle: Text("RSSI ${result.rssi}"),
          trailing: ElevatedButton(
            onPressed: isConnecting ? null : () => connect(result.device),
            child: const Text("Connect"),
          ),
        );
      }).toList(),
    );
  }

  Widget sensorCard(String label, String key, IconData icon) {
    return Card(
      child: ListTile(
        leading: Icon(icon),
        title: Text(label),
        trailing: Text(
          sensorValues[key] ?? "--",
          style: const TextStyle(fontSize: 20, fontWeight: FontWeight.bold),
        ),
      ),
    );
  }

  Widget commandButton(String label, String command, IconData icon) {
    return ElevatedButton.icon(
      onPressed: connectedDevice == null ? null : () => sendCommand(command),
      icon: Icon(icon),
      label: Text(label),
    );
  }

  Widget commandSlider(String label, String prefix) {
    final value = sliderValues[label] ?? 0;
    return Column(
      crossAxisAlignment: CrossAxisAlignment.start,
      children: [
        Text("$label: ${value.round()}"),
        Slider(
          value: value,
          max: 255,
          onChanged: (next) => setState(() => sliderValues[label] = next),
          onChangeEnd: (next) => sendCommand("$prefix${next.round()}"),
        ),
      ],
    );
  }
__COLOR_WIDGET__
  @override
  Widget build(BuildContext context) {
    return Scaffold(
      appBar: AppBar(title: const Text('__APP_TITLE__')),
      body: ListView(
        padding: const EdgeInsets.all(12),
        children: [
          statusCard(),
__BODY__          const SizedBox(height: 8),
          deviceList(),
        ],
      ),
      floatingActionButton: FloatingActionButton.extended(
        onPressed: isScanning ? null : startScan,
        icon: Icon(isScanning ? Icons.hourglass_top : Icons.search),
        label: Text(isScanning ? "Scanning" : "Scan"),
      ),
    );
  }
}
"#;

pub(crate) const COLOR_IMPORT: &str =
    "import 'package:flutter_colorpicker/flutter_colorpicker.dart';\n";

pub(crate) const COLOR_WIDGET: &str = r#"
  Widget colorPicker() {
    return Card(
      child: Padding(
        padding: const EdgeInsets.all(12),
        child: BlockPicker(
          pickerColor: selectedColor,
          onColorChanged: (color) {
            setState(() => selectedColor = color);
            sendCommand("C${color.red},${color.green},${color.blue}");
          },
        ),
      ),
    );
  }
"#;
